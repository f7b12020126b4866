pub mod connect;
pub mod load;
pub mod output;
