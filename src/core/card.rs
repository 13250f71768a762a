use crate::config::settings::CardSettings;
use crate::core::format::{format_in_zone, resolve_timezone};
use crate::core::view::{self, CardView};
use crate::dom::{NodeRef, WeakDocument};
use crate::domain::model::{CardConfiguration, UpdateRequest};
use crate::domain::ports::{TimeBroadcast, TimeHandler};
use crate::utils::error::{CardError, Result};
use crate::utils::validation::{validate_required_field, Validate};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, info, info_span, trace, Span};

#[derive(Debug, Default)]
struct CardState {
    /// Last string written to the time container.
    display: String,
    deleted: bool,
}

/// One dashboard card showing the current time of a single timezone.
///
/// The card validates its configuration, renders itself into the target
/// element and registers one [`TimeHandler`] with the broadcast service. The
/// same handler is unregistered when the delete icon is activated.
pub struct TimezoneCard {
    config: CardConfiguration,
    service: Rc<dyn TimeBroadcast>,
    settings: CardSettings,
    zone: Tz,
    view: CardView,
    handler: TimeHandler,
    state: Rc<RefCell<CardState>>,
}

impl TimezoneCard {
    pub fn new(config: CardConfiguration) -> Result<Self> {
        Self::with_settings(config, CardSettings::default())
    }

    pub fn with_settings(config: CardConfiguration, settings: CardSettings) -> Result<Self> {
        // 驗證順序固定，第一個失敗的檢查決定錯誤
        let target = validate_required_field(&config.target, CardError::MissingTargetElement)?;
        if !target.is_element() {
            return Err(CardError::NotDomElement);
        }

        let service = validate_required_field(
            &config.time_broadcast_service,
            CardError::MissingTimeBroadcastService,
        )?
        .as_broadcast()
        .cloned()
        .ok_or(CardError::WrongServiceInstance)?;

        let time = *validate_required_field(&config.time, CardError::MissingTime)?;

        let timezone_id = validate_required_field(&config.timezone, CardError::MissingTimezone)?
            .trim()
            .to_string();
        if timezone_id.is_empty() {
            return Err(CardError::MissingTimezone);
        }
        let zone = resolve_timezone(&timezone_id)?;
        settings.validate()?;

        let display = format_in_zone(time, zone, &settings.datetime_format);
        let view = view::render(
            target,
            &timezone_id,
            time.with_timezone(&zone),
            &display,
            &settings,
        );

        let state = Rc::new(RefCell::new(CardState {
            display,
            deleted: false,
        }));
        let span = info_span!("timezone_card", timezone = %timezone_id);
        let handler = Self::time_handler(
            span.clone(),
            target.document().downgrade(),
            &view,
            zone,
            settings.datetime_format.clone(),
            Rc::downgrade(&state),
        );

        service.register(handler.clone());
        Self::wire_delete(
            span.clone(),
            &view,
            service.clone(),
            handler.clone(),
            Rc::downgrade(&state),
        );
        Self::wire_change(span.clone(), &view, service.clone(), timezone_id);

        span.in_scope(|| info!("Timezone card mounted"));

        Ok(Self {
            config,
            service,
            settings,
            zone,
            view,
            handler,
            state,
        })
    }

    /// Handler registered with the service. It only holds weak references so
    /// the service never keeps the card or its document alive.
    fn time_handler(
        span: Span,
        document: WeakDocument,
        view: &CardView,
        zone: Tz,
        pattern: String,
        state: Weak<RefCell<CardState>>,
    ) -> TimeHandler {
        let time_container = view.time_container.id();

        Rc::new(move |time: DateTime<Utc>| {
            let _entered = span.enter();
            let formatted = format_in_zone(time, zone, &pattern);
            trace!(formatted = %formatted, "New time");

            if let Some(document) = document.upgrade() {
                document.node(time_container).set_text(&formatted);
            }
            if let Some(state) = state.upgrade() {
                state.borrow_mut().display = formatted;
            }
        })
    }

    fn wire_delete(
        span: Span,
        view: &CardView,
        service: Rc<dyn TimeBroadcast>,
        handler: TimeHandler,
        state: Weak<RefCell<CardState>>,
    ) {
        let document = view.root.document().downgrade();
        let root = view.root.id();

        view.delete_icon.add_click_listener(move || {
            let _entered = span.enter();
            service.unregister(&handler);
            if let Some(state) = state.upgrade() {
                state.borrow_mut().deleted = true;
            }
            // frees the icon too, so this listener runs at most once
            if let Some(document) = document.upgrade() {
                document.node(root).remove();
            }
            info!("Timezone card deleted");
        });
    }

    fn wire_change(span: Span, view: &CardView, service: Rc<dyn TimeBroadcast>, timezone: String) {
        let document = view.root.document().downgrade();
        let date_input = view.date_input.id();
        let time_input = view.time_input.id();

        view.change_button.add_click_listener(move || {
            let _entered = span.enter();
            let Some(document) = document.upgrade() else {
                return;
            };
            let request = UpdateRequest {
                timezone: timezone.clone(),
                date: input_value(&document.node(date_input)),
                time: input_value(&document.node(time_input)),
            };
            debug!(?request, "Requesting time update");
            service.update(request);
        });
    }

    /// Update callback: reformats `time` for this card's zone and redraws it.
    pub fn on_new_time(&self, time: DateTime<Utc>) {
        (self.handler)(time)
    }

    /// Activates the delete icon.
    pub fn delete(&self) {
        self.view.delete_icon.click();
    }

    /// Activates the change-timezone button.
    pub fn request_update(&self) {
        self.view.change_button.click();
    }

    pub fn config(&self) -> &CardConfiguration {
        &self.config
    }

    pub fn service(&self) -> &Rc<dyn TimeBroadcast> {
        &self.service
    }

    pub fn settings(&self) -> &CardSettings {
        &self.settings
    }

    pub fn view(&self) -> &CardView {
        &self.view
    }

    pub fn handler(&self) -> &TimeHandler {
        &self.handler
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// The formatted time last rendered into the time container.
    pub fn displayed_time(&self) -> String {
        self.state.borrow().display.clone()
    }

    pub fn is_deleted(&self) -> bool {
        self.state.borrow().deleted
    }
}

fn input_value(input: &NodeRef) -> Option<String> {
    input
        .value()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
