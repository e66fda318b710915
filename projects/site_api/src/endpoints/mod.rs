pub mod caller;
pub mod contact;
pub mod star;
