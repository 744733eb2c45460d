pub mod db;
pub mod mail;
