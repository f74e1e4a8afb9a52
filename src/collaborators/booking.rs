use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::json;
use url::Url;

use crate::config::BookingConfig;
use crate::document::{Document, ElementId};
use crate::logging::{LogLevel, json_kv};
use crate::runtime::{EventFlow, PageEffect, PagePlugin, RuntimeContext, RuntimeEvent};
use crate::timer::TimerId;
use crate::Result;

pub const SENDING_LABEL: &str = "Sending...";
pub const SENT_LABEL: &str = "Message Sent!";
pub const SENT_BACKGROUND: &str = "#22c55e";

/// Values read from the booking form at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingRequest {
    pub name: String,
    pub phone: String,
    pub vehicle: String,
    pub service: String,
    pub message: String,
}

impl BookingRequest {
    /// Chat message body, formatted with the messenger's bold markup.
    pub fn to_message(&self) -> String {
        format!(
            "*New Booking Request*\n\n*Name:* {}\n*Phone:* {}\n*Vehicle:* {}\n*Service:* {}\n*Message:* {}",
            self.name, self.phone, self.vehicle, self.service, self.message
        )
    }
}

/// URI component encoding: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `https://wa.me/<number>?text=<message>` with the message encoded as a URI
/// component, so spaces are `%20`.
pub fn whatsapp_link(number: &str, message: &str) -> Result<String> {
    let base = Url::parse(&format!("https://wa.me/{number}"))?;
    Ok(format!(
        "{base}?text={}",
        utf8_percent_encode(message, URI_COMPONENT)
    ))
}

#[derive(Debug, Clone)]
pub struct BookingFormIds {
    pub form: ElementId,
    pub button: ElementId,
    pub name: ElementId,
    pub phone: ElementId,
    pub vehicle: ElementId,
    pub service: ElementId,
    pub message: ElementId,
}

impl Default for BookingFormIds {
    fn default() -> Self {
        Self {
            form: "booking-form".to_string(),
            button: "booking-submit".to_string(),
            name: "booking-name".to_string(),
            phone: "booking-phone".to_string(),
            vehicle: "booking-vehicle".to_string(),
            service: "booking-service".to_string(),
            message: "booking-message".to_string(),
        }
    }
}

impl BookingFormIds {
    fn fields(&self) -> [&ElementId; 5] {
        [
            &self.name,
            &self.phone,
            &self.vehicle,
            &self.service,
            &self.message,
        ]
    }

    fn read(&self, document: &Document) -> BookingRequest {
        let value = |id: &str| document.value(id).unwrap_or_default().to_string();
        BookingRequest {
            name: value(&self.name),
            phone: value(&self.phone),
            vehicle: value(&self.vehicle),
            service: value(&self.service),
            message: value(&self.message),
        }
    }
}

#[derive(Debug)]
struct InFlight {
    original_label: String,
    sent: Option<TimerId>,
    restore: Option<TimerId>,
}

/// Turns a booking submission into a messaging deep link, then walks the
/// submit button through its sending, sent and restored states.
pub struct BookingFormPlugin {
    ids: BookingFormIds,
    whatsapp_number: String,
    sent_delay: Duration,
    restore_delay: Duration,
    in_flight: Option<InFlight>,
}

impl BookingFormPlugin {
    pub fn new(ids: BookingFormIds, config: &BookingConfig) -> Self {
        Self {
            ids,
            whatsapp_number: config.whatsapp_number.clone(),
            sent_delay: Duration::from_millis(config.sent_delay_ms),
            restore_delay: Duration::from_millis(config.restore_delay_ms),
            in_flight: None,
        }
    }

    fn submit(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        let request = self.ids.read(ctx.document());
        let message = request.to_message();
        let url = whatsapp_link(&self.whatsapp_number, &message)?;
        ctx.emit(PageEffect::OpenUrl {
            url,
            target: "_blank".to_string(),
        });

        let original_label = ctx
            .document()
            .text(&self.ids.button)
            .unwrap_or_default()
            .to_string();
        if ctx.document().contains(&self.ids.button) {
            let document = ctx.document_mut();
            document.set_text(&self.ids.button, SENDING_LABEL)?;
            document.set_disabled(&self.ids.button, true)?;
        }
        ctx.log(
            LogLevel::Info,
            "curtain::booking",
            "booking_submitted",
            [json_kv("message_chars", json!(message.chars().count()))],
        );
        self.in_flight = Some(InFlight {
            original_label,
            sent: Some(ctx.schedule_once(self.sent_delay, "booking.sent")),
            restore: None,
        });
        Ok(())
    }

    fn mark_sent(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        let button_present = ctx.document().contains(&self.ids.button);
        let document = ctx.document_mut();
        if button_present {
            document.set_text(&self.ids.button, SENT_LABEL)?;
            document.set_style(&self.ids.button, "background", SENT_BACKGROUND)?;
        }
        for field in self.ids.fields() {
            if document.value(field).is_some() {
                document.set_value(field, "")?;
            }
        }
        let restore = ctx.schedule_once(self.restore_delay, "booking.restore");
        if let Some(flight) = self.in_flight.as_mut() {
            flight.sent = None;
            flight.restore = Some(restore);
        }
        Ok(())
    }

    fn restore(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        let Some(flight) = self.in_flight.take() else {
            return Ok(());
        };
        if ctx.document().contains(&self.ids.button) {
            let document = ctx.document_mut();
            document.set_text(&self.ids.button, flight.original_label)?;
            document.remove_style(&self.ids.button, "background")?;
            document.set_disabled(&self.ids.button, false)?;
        }
        Ok(())
    }
}

impl Default for BookingFormPlugin {
    fn default() -> Self {
        Self::new(BookingFormIds::default(), &BookingConfig::default())
    }
}

impl PagePlugin for BookingFormPlugin {
    fn name(&self) -> &str {
        "curtain::booking"
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        match event {
            RuntimeEvent::Submit(form) if *form == self.ids.form => {
                // The button is disabled while a request is in flight.
                if self.in_flight.is_none() && ctx.document().contains(&self.ids.form) {
                    self.submit(ctx)?;
                }
                Ok(EventFlow::Consumed)
            }
            RuntimeEvent::Timer(fired) => {
                let (sent, restore) = match &self.in_flight {
                    Some(flight) => (flight.sent, flight.restore),
                    None => return Ok(EventFlow::Continue),
                };
                if sent == Some(fired.id) {
                    self.mark_sent(ctx)?;
                } else if restore == Some(fired.id) {
                    self.restore(ctx)?;
                } else {
                    return Ok(EventFlow::Continue);
                }
                Ok(EventFlow::Consumed)
            }
            _ => Ok(EventFlow::Continue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;
    use crate::runtime::PageRuntime;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn form_page() -> Document {
        let ids = BookingFormIds::default();
        let mut document = Document::new()
            .with_element(Element::block(ids.form.clone()))
            .unwrap()
            .with_element(Element::button(ids.button.clone(), "Book Now").with_parent(ids.form.clone()))
            .unwrap();
        for field in ids.fields() {
            document
                .insert(Element::input(field.clone()).with_parent(ids.form.clone()))
                .unwrap();
        }
        document.set_value(&ids.name, "Ana").unwrap();
        document.set_value(&ids.phone, "050 123").unwrap();
        document.set_value(&ids.vehicle, "Civic").unwrap();
        document.set_value(&ids.service, "Oil Change").unwrap();
        document.set_value(&ids.message, "Friday?").unwrap();
        document
    }

    fn runtime() -> PageRuntime {
        let mut runtime = PageRuntime::new(form_page());
        runtime.register_plugin(BookingFormPlugin::default());
        runtime.start().unwrap();
        runtime
    }

    #[test]
    fn message_lists_every_field() {
        let request = BookingRequest {
            name: "Ana".into(),
            phone: "050".into(),
            vehicle: "Civic".into(),
            service: "Detailing".into(),
            message: "".into(),
        };
        assert_eq!(
            request.to_message(),
            "*New Booking Request*\n\n*Name:* Ana\n*Phone:* 050\n*Vehicle:* Civic\n*Service:* Detailing\n*Message:* "
        );
    }

    #[test]
    fn deep_link_carries_the_message() {
        let link = whatsapp_link("+971526791455", "*Hi* there\nok").unwrap();
        assert!(link.starts_with("https://wa.me/+971526791455?text="));
        let parsed = Url::parse(&link).unwrap();
        let text = parsed
            .query_pairs()
            .find(|(key, _)| key == "text")
            .map(|(_, value)| value.into_owned());
        assert_eq!(text.as_deref(), Some("*Hi* there\nok"));
    }

    #[test]
    fn deep_link_uses_component_encoding() {
        let link = whatsapp_link("+971526791455", "*Name:* Ana (VIP)!\nit's ok").unwrap();
        assert_eq!(
            link,
            "https://wa.me/+971526791455?text=*Name%3A*%20Ana%20(VIP)!%0Ait's%20ok"
        );
    }

    #[test]
    fn submit_opens_link_and_walks_button_states() {
        let mut runtime = runtime();
        let flow = runtime
            .dispatch(RuntimeEvent::Submit("booking-form".into()))
            .unwrap();
        assert_eq!(flow, EventFlow::Consumed);

        let effects = runtime.drain_effects();
        let [PageEffect::OpenUrl { url, target }] = effects.as_slice() else {
            panic!("expected a single deep link, got {effects:?}");
        };
        assert_eq!(target, "_blank");
        assert!(url.contains("Civic"));

        assert_eq!(runtime.document().text("booking-submit"), Some(SENDING_LABEL));
        assert!(runtime.document().is_disabled("booking-submit"));

        runtime.advance(ms(1000)).unwrap();
        assert_eq!(runtime.document().text("booking-submit"), Some(SENT_LABEL));
        assert_eq!(
            runtime.document().style("booking-submit", "background"),
            Some(SENT_BACKGROUND)
        );
        assert_eq!(runtime.document().value("booking-name"), Some(""));
        assert!(runtime.document().is_disabled("booking-submit"));

        runtime.advance(ms(3000)).unwrap();
        assert_eq!(runtime.document().text("booking-submit"), Some("Book Now"));
        assert_eq!(runtime.document().style("booking-submit", "background"), None);
        assert!(!runtime.document().is_disabled("booking-submit"));
    }

    #[test]
    fn resubmitting_while_in_flight_is_ignored() {
        let mut runtime = runtime();
        runtime
            .dispatch(RuntimeEvent::Submit("booking-form".into()))
            .unwrap();
        runtime
            .dispatch(RuntimeEvent::Submit("booking-form".into()))
            .unwrap();
        assert_eq!(runtime.drain_effects().len(), 1);
        assert_eq!(runtime.pending_timers(), 1);
    }
}
