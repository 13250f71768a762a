use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::cell::RefCell;
use std::rc::Rc;
use timezone_card::utils::logger::{self, LogFormat};
use timezone_card::utils::validation::Validate;
use timezone_card::{
    CardConfiguration, CardError, CardSettings, CliConfig, Document, TimeBroadcast, TimeHandler,
    TimezoneCard, UpdateRequest,
};

/// Broadcaster that always reports the same instant.
struct FixedClock {
    now: DateTime<Utc>,
    handlers: RefCell<Vec<TimeHandler>>,
}

impl FixedClock {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            handlers: RefCell::new(Vec::new()),
        }
    }

    fn broadcast(&self) {
        let handlers = self.handlers.borrow().clone();
        for handler in handlers {
            handler(self.now);
        }
    }
}

impl TimeBroadcast for FixedClock {
    fn register(&self, handler: TimeHandler) {
        self.handlers.borrow_mut().push(handler);
    }

    fn unregister(&self, handler: &TimeHandler) {
        self.handlers
            .borrow_mut()
            .retain(|registered| !Rc::ptr_eq(registered, handler));
    }

    fn update(&self, request: UpdateRequest) {
        tracing::debug!(?request, "Update requested");
        self.broadcast();
    }
}

fn run(config: &CliConfig) -> anyhow::Result<String> {
    config.validate().context("Invalid command line")?;

    let settings = match &config.settings {
        Some(path) => CardSettings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => CardSettings::default(),
    };
    settings.validate().context("Invalid card settings")?;

    let document = Document::new();
    let host = document.create_element("div");
    host.add_class("dashboard");

    let clock = Rc::new(FixedClock::new(config.instant()?));
    let card = TimezoneCard::with_settings(
        CardConfiguration::new(host.clone(), clock.clone(), clock.now, &config.timezone),
        settings,
    )
    .with_context(|| format!("Failed to mount a card for {:?}", config.timezone))?;

    clock.broadcast();
    tracing::info!("🕒 {} → {}", config.timezone, card.displayed_time());

    Ok(host.outer_html())
}

/// 根據錯誤種類決定退出碼
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<CardError>() {
        Some(e) if e.is_construction_error() => 2,
        _ => 1,
    }
}

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(LogFormat::from_flags(config.json_logs), config.verbose);

    match run(&config) {
        Ok(html) => {
            println!("{}", html);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Rendering failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            if let Some(card_error) = e.downcast_ref::<CardError>() {
                eprintln!("💡 {}", card_error.recovery_suggestion());
            }
            std::process::exit(exit_code(&e));
        }
    }
}
