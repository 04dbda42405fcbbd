pub mod user;

pub use user::{AccountState, NewUser, User, UserPatch};
