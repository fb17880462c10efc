pub mod aggregate;
pub mod domain;
pub mod geo;
pub mod hearts;
pub mod listing;
pub mod ports;
pub mod search;
pub mod slug;
pub mod validation;

pub use domain::{
    AuthSession, Location, NewReview, Review, ScoredStore, Store, StoreDetail, StoreFields,
    TagCount, TopStore, User, UserCredentials,
};
pub use geo::GeoPoint;
pub use ports::{DatabaseService, Mail, MailService, PortError, PortResult};
pub use validation::{FieldError, StoreDraft, ValidationError};
