use chrono::{DateTime, TimeZone, Utc};
use std::cell::RefCell;
use std::rc::Rc;
use timezone_card::core::format::{format_in_zone, resolve_timezone, LONG_DATE_TIME};
use timezone_card::{
    CardConfiguration, CardError, CardSettings, Document, ElementsQuery, NodeRef, ServiceRef,
    TimeBroadcast, TimeHandler, TimezoneCard, UpdateRequest,
};

/// Records every call so tests can assert on them.
#[derive(Default)]
struct StoreCurrentTimeMock {
    registered: RefCell<Vec<TimeHandler>>,
    unregistered: RefCell<Vec<TimeHandler>>,
    updates: RefCell<Vec<UpdateRequest>>,
}

impl TimeBroadcast for StoreCurrentTimeMock {
    fn register(&self, handler: TimeHandler) {
        self.registered.borrow_mut().push(handler);
    }

    fn unregister(&self, handler: &TimeHandler) {
        self.unregistered.borrow_mut().push(handler.clone());
    }

    fn update(&self, request: UpdateRequest) {
        self.updates.borrow_mut().push(request);
    }
}

struct Fixture {
    document: Document,
    div_holder: NodeRef,
    store: Rc<StoreCurrentTimeMock>,
    card: TimezoneCard,
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap()
}

fn setup() -> Fixture {
    let document = Document::new();
    let div_holder = document.create_element("div");
    let store = Rc::new(StoreCurrentTimeMock::default());
    let config = CardConfiguration::new(div_holder.clone(), store.clone(), noon(), "GMT");
    let card = TimezoneCard::new(config).unwrap();

    Fixture {
        document,
        div_holder,
        store,
        card,
    }
}

fn construction_error(config: CardConfiguration) -> CardError {
    match TimezoneCard::new(config) {
        Ok(_) => panic!("construction should fail"),
        Err(e) => e,
    }
}

fn service() -> Option<ServiceRef> {
    Some(ServiceRef::broadcast(Rc::new(StoreCurrentTimeMock::default())))
}

mod passing_config_to_constructor {
    use super::*;

    #[test]
    fn test_fails_without_target_element() {
        let err = construction_error(CardConfiguration::default());
        assert!(matches!(err, CardError::MissingTargetElement));
        assert_eq!(err.to_string(), "Missing target element");
    }

    #[test]
    fn test_fails_when_target_is_not_an_element() {
        let document = Document::new();
        let err = construction_error(CardConfiguration {
            target: Some(document.create_text_node("123")),
            ..CardConfiguration::default()
        });
        assert!(matches!(err, CardError::NotDomElement));
    }

    #[test]
    fn test_fails_when_target_was_removed() {
        let document = Document::new();
        let target = document.create_element("div");
        target.remove();

        let err = construction_error(CardConfiguration {
            target: Some(target),
            time_broadcast_service: service(),
            time: Some(noon()),
            timezone: Some("GMT".to_string()),
        });
        assert!(matches!(err, CardError::NotDomElement));
    }

    #[test]
    fn test_fails_without_time_broadcast_service() {
        let err = construction_error(CardConfiguration {
            target: Some(Document::new().create_element("div")),
            ..CardConfiguration::default()
        });
        assert!(matches!(err, CardError::MissingTimeBroadcastService));
    }

    #[test]
    fn test_fails_when_service_is_a_different_instance() {
        fn example() {}

        let err = construction_error(CardConfiguration {
            target: Some(Document::new().create_element("div")),
            time_broadcast_service: Some(ServiceRef::foreign(example as fn())),
            ..CardConfiguration::default()
        });
        assert!(matches!(err, CardError::WrongServiceInstance));
    }

    #[test]
    fn test_fails_without_time() {
        let err = construction_error(CardConfiguration {
            target: Some(Document::new().create_element("div")),
            time_broadcast_service: service(),
            ..CardConfiguration::default()
        });
        assert!(matches!(err, CardError::MissingTime));
    }

    #[test]
    fn test_fails_without_timezone() {
        let err = construction_error(CardConfiguration {
            target: Some(Document::new().create_element("div")),
            time_broadcast_service: service(),
            time: Some(noon()),
            timezone: None,
        });
        assert!(matches!(err, CardError::MissingTimezone));

        let err = construction_error(CardConfiguration {
            target: Some(Document::new().create_element("div")),
            time_broadcast_service: service(),
            time: Some(noon()),
            timezone: Some("  ".to_string()),
        });
        assert!(matches!(err, CardError::MissingTimezone));
    }

    #[test]
    fn test_fails_with_unknown_timezone() {
        let err = construction_error(CardConfiguration {
            target: Some(Document::new().create_element("div")),
            time_broadcast_service: service(),
            time: Some(noon()),
            timezone: Some("Atlantis/Central".to_string()),
        });
        assert!(matches!(err, CardError::UnknownTimezone { .. }));
    }

    #[test]
    fn test_earlier_checks_take_precedence() {
        let document = Document::new();

        // invalid target wins over everything that follows
        let err = construction_error(CardConfiguration {
            target: Some(document.create_text_node("x")),
            time_broadcast_service: Some(ServiceRef::foreign(42_u32)),
            time: None,
            timezone: None,
        });
        assert!(matches!(err, CardError::NotDomElement));

        let err = construction_error(CardConfiguration {
            target: Some(document.create_element("div")),
            time_broadcast_service: Some(ServiceRef::foreign("store")),
            time: None,
            timezone: None,
        });
        assert!(matches!(err, CardError::WrongServiceInstance));

        let err = construction_error(CardConfiguration {
            target: Some(document.create_element("div")),
            time_broadcast_service: service(),
            time: None,
            timezone: Some("Atlantis/Central".to_string()),
        });
        assert!(matches!(err, CardError::MissingTime));
    }

    #[test]
    fn test_failed_construction_renders_and_registers_nothing() {
        let document = Document::new();
        let target = document.create_element("div");
        let store = Rc::new(StoreCurrentTimeMock::default());

        let result = TimezoneCard::new(CardConfiguration {
            target: Some(target.clone()),
            time_broadcast_service: Some(ServiceRef::broadcast(store.clone())),
            time: Some(noon()),
            timezone: None,
        });

        assert!(result.is_err());
        assert!(target.children().is_empty());
        assert!(store.registered.borrow().is_empty());
    }

    #[test]
    fn test_fails_with_invalid_settings() {
        let document = Document::new();
        let store = Rc::new(StoreCurrentTimeMock::default());
        let settings = CardSettings {
            datetime_format: "%Q".to_string(),
            ..CardSettings::default()
        };

        let result = TimezoneCard::with_settings(
            CardConfiguration::new(document.create_element("div"), store, noon(), "GMT"),
            settings,
        );
        assert!(matches!(
            result,
            Err(CardError::InvalidConfigValueError { .. })
        ));
    }
}

mod constructor {
    use super::*;

    #[test]
    fn test_keeps_config_as_supplied() {
        let f = setup();
        let config = f.card.config();

        assert_eq!(config.target.as_ref(), Some(&f.div_holder));
        assert_eq!(config.time, Some(noon()));
        assert_eq!(config.timezone.as_deref(), Some("GMT"));
    }

    #[test]
    fn test_assigns_time_broadcast_service() {
        let f = setup();
        let expected: Rc<dyn TimeBroadcast> = f.store.clone();
        assert!(std::ptr::addr_eq(
            Rc::as_ptr(f.card.service()),
            Rc::as_ptr(&expected)
        ));
    }

    #[test]
    fn test_renders_every_element() {
        let f = setup();
        for selector in ElementsQuery::ALL {
            let element = f.div_holder.query_selector(selector);
            assert!(
                element.as_ref().and_then(NodeRef::tag_name).is_some(),
                "missing {}",
                selector
            );
        }
    }

    #[test]
    fn test_view_holds_the_rendered_elements() {
        let f = setup();
        let view = f.card.view();
        let query = |selector| f.div_holder.query_selector(selector);

        assert_eq!(query(ElementsQuery::TIME_CONTAINER), Some(view.time_container.clone()));
        assert_eq!(query(ElementsQuery::DELETE_ICON), Some(view.delete_icon.clone()));
        assert_eq!(query(ElementsQuery::DATE_INPUT), Some(view.date_input.clone()));
        assert_eq!(query(ElementsQuery::TIME_INPUT), Some(view.time_input.clone()));
        assert_eq!(query(ElementsQuery::CHANGE_BUTTON), Some(view.change_button.clone()));
    }

    #[test]
    fn test_initial_time_is_long_format_in_zone() {
        let f = setup();
        assert_eq!(
            f.card.view().time_container.text_content(),
            "Jan 1, 2020 12:00 PM"
        );
        assert_eq!(f.card.displayed_time(), "Jan 1, 2020 12:00 PM");
    }

    #[test]
    fn test_initial_time_respects_timezone() {
        let document = Document::new();
        let holder = document.create_element("div");
        let store = Rc::new(StoreCurrentTimeMock::default());

        let card = TimezoneCard::new(CardConfiguration::new(
            holder.clone(),
            store,
            noon(),
            "Asia/Kolkata",
        ))
        .unwrap();

        let text = holder
            .query_selector(ElementsQuery::TIME_CONTAINER)
            .unwrap()
            .text_content();
        assert_eq!(text, "Jan 1, 2020 5:30 PM");
        assert_eq!(card.zone(), resolve_timezone("Asia/Kolkata").unwrap());
    }

    #[test]
    fn test_timezone_id_is_trimmed_everywhere() {
        let document = Document::new();
        let holder = document.create_element("div");
        let store = Rc::new(StoreCurrentTimeMock::default());

        let card = TimezoneCard::new(CardConfiguration::new(
            holder.clone(),
            store.clone(),
            noon(),
            "  Europe/Warsaw \t",
        ))
        .unwrap();
        card.request_update();

        assert_eq!(
            card.view().root.attribute("data-timezone").as_deref(),
            Some("Europe/Warsaw")
        );
        assert_eq!(
            holder.query_selector(".timezone-card__zone").unwrap().text_content(),
            "Europe/Warsaw"
        );
        assert_eq!(store.updates.borrow()[0].timezone, "Europe/Warsaw");
        assert_eq!(card.displayed_time(), "Jan 1, 2020 1:00 PM");
    }

    #[test]
    fn test_registers_its_handler_once() {
        let f = setup();
        let registered = f.store.registered.borrow();
        assert_eq!(registered.len(), 1);
        assert!(Rc::ptr_eq(&registered[0], f.card.handler()));
    }

    #[test]
    fn test_cards_share_one_service() {
        let f = setup();
        let second = TimezoneCard::new(CardConfiguration::new(
            f.div_holder.clone(),
            f.store.clone(),
            noon(),
            "Europe/Warsaw",
        ))
        .unwrap();

        assert_eq!(f.div_holder.query_selector_all(ElementsQuery::CARD).len(), 2);
        let registered = f.store.registered.borrow();
        assert_eq!(registered.len(), 2);
        assert!(!Rc::ptr_eq(&registered[0], &registered[1]));
        assert!(Rc::ptr_eq(&registered[1], second.handler()));
    }
}

mod delete_icon {
    use super::*;

    #[test]
    fn test_click_unregisters_the_registered_handler() {
        let f = setup();
        f.card.view().delete_icon.click();

        let unregistered = f.store.unregistered.borrow();
        assert_eq!(unregistered.len(), 1);
        assert!(Rc::ptr_eq(&unregistered[0], &f.store.registered.borrow()[0]));
        assert!(f.card.is_deleted());
    }

    #[test]
    fn test_click_removes_the_card_from_the_holder() {
        let f = setup();
        f.card.view().delete_icon.click();

        assert!(f.div_holder.query_selector(ElementsQuery::TIME_CONTAINER).is_none());
        assert!(f.div_holder.query_selector(ElementsQuery::CARD).is_none());
        assert!(f.div_holder.children().is_empty());
        assert_eq!(f.document.live_nodes(), 1);
    }

    #[test]
    fn test_second_delete_is_a_no_op() {
        let f = setup();
        f.card.delete();
        f.card.delete();

        assert_eq!(f.store.unregistered.borrow().len(), 1);
    }

    #[test]
    fn test_delete_leaves_other_cards_alone() {
        let f = setup();
        let other = TimezoneCard::new(CardConfiguration::new(
            f.div_holder.clone(),
            f.store.clone(),
            noon(),
            "UTC",
        ))
        .unwrap();

        f.card.delete();

        let cards = f.div_holder.query_selector_all(ElementsQuery::CARD);
        assert_eq!(cards, vec![other.view().root.clone()]);
        assert!(!other.is_deleted());
    }

    #[test]
    fn test_time_after_delete_does_not_touch_the_document() {
        let f = setup();
        f.card.delete();
        let live = f.document.live_nodes();

        f.card.on_new_time(Utc.with_ymd_and_hms(2021, 6, 1, 8, 30, 0).unwrap());

        assert_eq!(f.document.live_nodes(), live);
        assert_eq!(f.card.displayed_time(), "Jun 1, 2021 8:30 AM");
    }
}

mod change_button {
    use super::*;

    #[test]
    fn test_click_requests_update() {
        let f = setup();
        f.card.view().change_button.click();

        let updates = f.store.updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(
            updates[0],
            UpdateRequest {
                timezone: "GMT".to_string(),
                date: Some("2020-01-01".to_string()),
                time: Some("12:00".to_string()),
            }
        );
    }

    #[test]
    fn test_one_update_per_activation() {
        let f = setup();
        f.card.request_update();
        f.card.request_update();
        f.card.request_update();

        assert_eq!(f.store.updates.borrow().len(), 3);
        assert!(f.store.unregistered.borrow().is_empty());
    }

    #[test]
    fn test_request_carries_edited_inputs() {
        let f = setup();
        f.card.view().date_input.set_value("2024-02-29");
        f.card.view().time_input.set_value("  ");
        f.card.request_update();

        let updates = f.store.updates.borrow();
        assert_eq!(updates[0].date.as_deref(), Some("2024-02-29"));
        assert_eq!(updates[0].time, None);
    }
}

mod on_new_time {
    use super::*;

    fn later() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 3, 8, 21, 45, 30).unwrap()
    }

    #[test]
    fn test_updates_displayed_time() {
        let f = setup();
        let expected = format_in_zone(later(), resolve_timezone("GMT").unwrap(), LONG_DATE_TIME);

        f.card.on_new_time(later());

        assert_eq!(f.card.displayed_time(), expected);
        assert_eq!(expected, "Mar 8, 2020 9:45 PM");
        // the configuration keeps the initial instant
        assert_eq!(f.card.config().time, Some(noon()));
    }

    #[test]
    fn test_updates_dom() {
        let f = setup();
        f.card.on_new_time(later());

        assert_eq!(
            f.card.view().time_container.text_content(),
            "Mar 8, 2020 9:45 PM"
        );
    }

    #[test]
    fn test_is_idempotent() {
        let f = setup();
        f.card.on_new_time(later());
        let first = f.card.view().time_container.text_content();
        let live = f.document.live_nodes();

        f.card.on_new_time(later());

        assert_eq!(f.card.view().time_container.text_content(), first);
        assert_eq!(f.card.displayed_time(), first);
        assert_eq!(f.document.live_nodes(), live);
    }

    #[test]
    fn test_registered_handler_is_the_update_callback() {
        let f = setup();
        let handler = f.store.registered.borrow()[0].clone();

        handler(later());

        assert_eq!(f.card.displayed_time(), "Mar 8, 2020 9:45 PM");
    }

    #[test]
    fn test_converts_to_card_zone() {
        let document = Document::new();
        let holder = document.create_element("div");
        let store = Rc::new(StoreCurrentTimeMock::default());
        let card = TimezoneCard::new(CardConfiguration::new(
            holder,
            store,
            noon(),
            "America/Los_Angeles",
        ))
        .unwrap();

        card.on_new_time(later());

        // DST starts on Mar 8, 2020 in Los Angeles
        assert_eq!(card.displayed_time(), "Mar 8, 2020 2:45 PM");
    }

    #[test]
    fn test_uses_configured_format() {
        let document = Document::new();
        let holder = document.create_element("div");
        let store = Rc::new(StoreCurrentTimeMock::default());
        let settings = CardSettings {
            datetime_format: "%Y-%m-%d %H:%M".to_string(),
            ..CardSettings::default()
        };
        let card = TimezoneCard::with_settings(
            CardConfiguration::new(holder, store, noon(), "Europe/Berlin"),
            settings,
        )
        .unwrap();

        assert_eq!(card.settings().datetime_format, "%Y-%m-%d %H:%M");
        assert_eq!(card.displayed_time(), "2020-01-01 13:00");
        card.on_new_time(later());
        assert_eq!(card.displayed_time(), "2020-03-08 22:45");
    }
}

#[test]
fn test_dropping_everything_releases_the_document() {
    let f = setup();
    let weak = f.document.downgrade();
    let Fixture {
        document,
        div_holder,
        store,
        card,
    } = f;

    drop(card);
    drop(div_holder);
    drop(document);
    assert!(weak.upgrade().is_none());
    drop(store);
}
