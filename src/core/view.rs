use crate::config::settings::CardSettings;
use crate::dom::NodeRef;
use chrono::DateTime;
use chrono_tz::Tz;

/// The rendered markup of one card. The card owns this subtree until it is deleted.
#[derive(Debug, Clone)]
pub struct CardView {
    pub root: NodeRef,
    pub time_container: NodeRef,
    pub delete_icon: NodeRef,
    pub date_input: NodeRef,
    pub time_input: NodeRef,
    pub change_button: NodeRef,
}

/// Builds the card markup and appends it to `target`.
///
/// ```text
/// div.timezone-card
///   div.timezone-card__header
///     span.timezone-card__zone
///     i.timezone-card__delete
///   div.timezone-card__time
///   div.timezone-card__controls
///     label > input.timezone-card__date-input
///     label > input.timezone-card__time-input
///     button.timezone-card__change
/// ```
pub fn render(
    target: &NodeRef,
    timezone_id: &str,
    local_time: DateTime<Tz>,
    display: &str,
    settings: &CardSettings,
) -> CardView {
    let document = target.document();
    let element = |tag: &str, class: &str| {
        let node = document.create_element(tag);
        node.add_class(class);
        node
    };

    let root = element("div", "timezone-card");
    root.set_attribute("data-timezone", timezone_id);

    let header = element("div", "timezone-card__header");
    let zone = element("span", "timezone-card__zone");
    zone.set_text(timezone_id);
    let delete_icon = element("i", "timezone-card__delete");
    delete_icon.set_attribute("role", "button");
    delete_icon.set_attribute("title", "Delete");
    header.append_child(&zone);
    header.append_child(&delete_icon);

    let time_container = element("div", "timezone-card__time");
    time_container.set_text(display);

    let controls = element("div", "timezone-card__controls");

    let date_label = element("label", "timezone-card__date-label");
    date_label.set_text("Date");
    let date_input = element("input", "timezone-card__date-input");
    date_input.set_attribute("type", "date");
    date_input.set_value(&local_time.format(&settings.date_input_format).to_string());
    date_label.append_child(&date_input);

    let time_label = element("label", "timezone-card__time-label");
    time_label.set_text("Time");
    let time_input = element("input", "timezone-card__time-input");
    time_input.set_attribute("type", "time");
    time_input.set_value(&local_time.format(&settings.time_input_format).to_string());
    time_label.append_child(&time_input);

    let change_button = element("button", "timezone-card__change");
    change_button.set_attribute("type", "button");
    change_button.set_text(&settings.change_button_label);

    controls.append_child(&date_label);
    controls.append_child(&time_label);
    controls.append_child(&change_button);

    root.append_child(&header);
    root.append_child(&time_container);
    root.append_child(&controls);
    target.append_child(&root);

    CardView {
        root,
        time_container,
        delete_icon,
        date_input,
        time_input,
        change_button,
    }
}
