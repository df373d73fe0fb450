// Service exports
pub mod geocoder;
pub mod mailer;
pub mod memory;
pub mod notifier;
pub mod postgres;
pub mod seed;
pub mod store;

pub use geocoder::{Geocoder, GeocoderError, NominatimGeocoder, NoopGeocoder};
pub use mailer::{EmailContext, EmailTemplate, HttpMailer, LogMailer, Mailer, MailerError, OutgoingEmail};
pub use memory::MemoryStore;
pub use notifier::{ChannelNotifier, EmailNotice, Notice, Notifier, SiteInfo};
pub use postgres::PostgresStore;
pub use store::{ProfileStore, StoreError};
