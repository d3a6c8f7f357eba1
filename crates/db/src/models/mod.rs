pub mod slot_configuration;
