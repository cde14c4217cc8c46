pub mod category;
pub mod contact;
pub mod document;
pub mod image;
pub mod user;
