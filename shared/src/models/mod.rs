//! Entity models and request payloads
//!
//! One file per entity, each with the stored entity plus its
//! Create/Update payload structs. Wire format is camelCase JSON;
//! credentials are never serialized outward.

pub mod address;
pub mod courier;
pub mod order;
pub mod role;
pub mod session;
pub mod user;
pub mod webhook;

pub use address::{Address, AddressCreate, AddressUpdate};
pub use courier::{
    AvailabilityStatus, CourierProfile, CourierProfileUpdate, VerificationStatus,
    VerificationUpdate,
};
pub use order::{
    AssignRequest, CancelRequest, FinanceSnapshot, Order, OrderCreate, OrderEvent, OrderEventType,
    OrderPatch, OrderStatus,
};
pub use role::{Role, RoleCreate, RoleUpdate};
pub use session::Session;
pub use user::{RegisterRequest, User, UserStatus, UserType, UserUpdate};
pub use webhook::{Webhook, WebhookCreate, WebhookDelivery, WebhookUpdate};
