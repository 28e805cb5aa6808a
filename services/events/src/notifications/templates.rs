//! Notification email bodies

use common::users::User;

use super::Email;
use crate::models::Event;

const FALLBACK_NAME: &str = "User";

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn greeting_name(user: &User) -> String {
    let name = user.name.trim();
    escape_html(if name.is_empty() { FALLBACK_NAME } else { name })
}

fn details(event: &Event) -> String {
    format!(
        "<ul>\n  <li>Date: {}</li>\n  <li>Time: {}</li>\n  <li>Location: {}</li>\n</ul>",
        event.date.format("%B %-d, %Y"),
        escape_html(&event.time),
        escape_html(&event.location),
    )
}

/// Sent to the host once their event is listed
pub fn event_created(host: &User, event: &Event) -> Email {
    let html = format!(
        "<h1>Event Created Successfully!</h1>\n\
         <p>Dear {},</p>\n\
         <p>Your event \"<strong>{}</strong>\" has been successfully created and is now listed on EventHub.</p>\n\
         <p>Details:</p>\n\
         {}\n\
         <p>Thank you for using EventHub!</p>",
        greeting_name(host),
        escape_html(&event.title),
        details(event),
    );

    Email {
        to: host.email.clone(),
        subject: "Your Event has been Created!".to_string(),
        html,
    }
}

/// Sent to a booker, with the number of distinct events they have booked
pub fn booking_confirmed(booker: &User, event: &Event, total_booked: i64) -> Email {
    let html = format!(
        "<h1>Booking Confirmed!</h1>\n\
         <p>Dear {},</p>\n\
         <p>You have successfully booked a ticket for the event: \"<strong>{}</strong>\".</p>\n\
         <p>Event Details:</p>\n\
         {}\n\
         <p>You have now made bookings for a total of <strong>{}</strong> event(s) on EventHub.</p>\n\
         <p>Thank you for using EventHub!</p>",
        greeting_name(booker),
        escape_html(&event.title),
        details(event),
        total_booked,
    );

    Email {
        to: booker.email.clone(),
        subject: "Event Booking Confirmation!".to_string(),
        html,
    }
}
