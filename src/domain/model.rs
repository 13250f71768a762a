use crate::dom::NodeRef;
use crate::domain::ports::TimeBroadcast;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Value supplied for the service slot of a [`CardConfiguration`].
#[derive(Clone)]
pub enum ServiceRef {
    Broadcast(Rc<dyn TimeBroadcast>),
    /// Anything that is not a broadcast service; rejected at construction.
    Foreign(Rc<dyn Any>),
}

impl ServiceRef {
    pub fn broadcast<S: TimeBroadcast + 'static>(service: Rc<S>) -> Self {
        ServiceRef::Broadcast(service)
    }

    pub fn foreign<T: Any>(value: T) -> Self {
        ServiceRef::Foreign(Rc::new(value))
    }

    pub fn as_broadcast(&self) -> Option<&Rc<dyn TimeBroadcast>> {
        match self {
            ServiceRef::Broadcast(service) => Some(service),
            ServiceRef::Foreign(_) => None,
        }
    }
}

impl fmt::Debug for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceRef::Broadcast(_) => f.write_str("ServiceRef::Broadcast"),
            ServiceRef::Foreign(_) => f.write_str("ServiceRef::Foreign"),
        }
    }
}

/// Construction input of a card. Every field is optional so that each missing
/// piece maps to its own construction error.
#[derive(Debug, Clone, Default)]
pub struct CardConfiguration {
    pub target: Option<NodeRef>,
    pub time_broadcast_service: Option<ServiceRef>,
    pub time: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
}

impl CardConfiguration {
    pub fn new<S: TimeBroadcast + 'static>(
        target: NodeRef,
        service: Rc<S>,
        time: DateTime<Utc>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            target: Some(target),
            time_broadcast_service: Some(ServiceRef::broadcast(service)),
            time: Some(time),
            timezone: Some(timezone.into()),
        }
    }
}

/// Argument of [`TimeBroadcast::update`]: what the card knows when the user
/// asks for a change. The service decides what to do with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub timezone: String,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Stable selectors of the card markup.
pub struct ElementsQuery;

impl ElementsQuery {
    pub const CARD: &'static str = ".timezone-card";
    pub const TIME_CONTAINER: &'static str = ".timezone-card__time";
    pub const DELETE_ICON: &'static str = ".timezone-card__delete";
    pub const DATE_INPUT: &'static str = ".timezone-card__date-input";
    pub const TIME_INPUT: &'static str = ".timezone-card__time-input";
    pub const CHANGE_BUTTON: &'static str = ".timezone-card__change";

    pub const ALL: [&'static str; 5] = [
        Self::TIME_CONTAINER,
        Self::DELETE_ICON,
        Self::DATE_INPUT,
        Self::TIME_INPUT,
        Self::CHANGE_BUTTON,
    ];
}
