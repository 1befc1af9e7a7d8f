pub mod test_app;
pub mod test_learner;
