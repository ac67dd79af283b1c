pub mod drive_client;

pub use drive_client::DriveFolderClient;
