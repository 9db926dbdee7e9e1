pub mod models;
pub mod service;
pub mod store;

pub use models::{Member, NewMember, UpdateProfile};
pub use service::{MemberError, MemberService};
pub use store::{BaseMemberStore, MemberStoreError, PgMemberStore};
