pub mod pcm_reader;
