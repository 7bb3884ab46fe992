pub mod booking;
pub mod chemical_addition;
pub mod company;
pub mod customer;
pub mod dashboard;
pub mod equipment;
pub mod equipment_failure;
pub mod equipment_maintenance_log;
pub mod job;
pub mod plant_room;
pub mod plant_room_check;
pub mod profile;
pub mod property;
pub mod rate_limit;
pub mod report;
pub mod scheduling_rule;
pub mod service;
pub mod team_invitation;
pub mod template;
pub mod unit;
pub mod water_test;
