pub mod cgra;
