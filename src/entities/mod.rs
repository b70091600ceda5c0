pub mod admin;
pub mod agent;
pub mod amenity;
pub mod article;
pub mod category;
pub mod favorite;
pub mod feature;
pub mod image;
pub mod installment;
pub mod listing;
pub mod message;
pub mod project;
pub mod property;
pub mod property_type;
pub mod unit;
pub mod user;
pub mod view;
