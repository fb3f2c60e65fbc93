mod public_dir;

pub use public_dir::PublicDir;
