#[cfg(test)]
pub mod app_client_tests;
#[cfg(test)]
pub mod deploy_tests;
#[cfg(test)]
pub mod utils;
