pub mod comment_thread;
pub mod discussion_board;
pub mod list_controller;
pub mod thread_controller;
pub mod uploader;

pub use comment_thread::{CommentInput, CommentThread};
pub use discussion_board::{DiscussionBoard, DiscussionThread};
pub use list_controller::ListController;
pub use thread_controller::ThreadController;
pub use uploader::{BlobUploader, FileUpload, UploadedFile};
