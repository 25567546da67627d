mod events;
mod fakes;
mod logger;
mod models;
mod settings;
mod store;
