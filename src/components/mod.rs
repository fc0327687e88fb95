pub mod branch_system;
