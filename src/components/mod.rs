pub mod map_nav;
pub mod notice;
pub mod submission_form;

pub use map_nav::MapNav;
pub use notice::{use_notice, NoticeBanner};
pub use submission_form::SubmissionForm;
