//! Page behaviours that hang off the bootstrap sequencer: the hero reveal,
//! scroll-driven reveals, the navbar state, the mobile menu, and the booking
//! form.

mod booking;
mod hero;
mod menu;
mod navbar;
mod scroll;

pub use booking::{
    BookingFormIds, BookingFormPlugin, BookingRequest, SENDING_LABEL, SENT_BACKGROUND, SENT_LABEL,
    whatsapp_link,
};
pub use hero::{HeroRevealPlugin, HeroRevealTargets};
pub use menu::{ACTIVE_CLASS, MobileMenuPlugin, MobileMenuTargets};
pub use navbar::{NavbarPlugin, SCROLLED_CLASS};
pub use scroll::{PARALLAX_CLASS, RevealDirection, ScrollRevealPlugin, parallax_position};
