pub mod storage;
pub mod unzip_service;
