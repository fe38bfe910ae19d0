pub mod review_writer;
