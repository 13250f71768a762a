use crate::domain::model::UpdateRequest;
use chrono::{DateTime, Utc};
use std::rc::Rc;

/// Callback a card hands to the broadcast service. Identity (`Rc::ptr_eq`) is
/// what the service uses to tell registrations apart.
pub type TimeHandler = Rc<dyn Fn(DateTime<Utc>)>;

/// The shared "current time" store every card on a dashboard subscribes to.
///
/// Methods take `&self`: one service instance is shared by many cards, so
/// implementations keep their registrations behind interior mutability.
pub trait TimeBroadcast {
    fn register(&self, handler: TimeHandler);
    fn unregister(&self, handler: &TimeHandler);
    fn update(&self, request: UpdateRequest);
}
