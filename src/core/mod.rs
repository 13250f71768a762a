pub mod card;
pub mod format;
pub mod view;
