mod coordinator;
mod helpers;
mod restart;
mod service;
