mod builder;
mod cache;
mod matching;
mod util;
