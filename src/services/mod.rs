pub mod assets;
pub mod pipeline;
pub mod process;
pub mod storage;
pub mod video_repository;
