pub mod analyser;
pub mod decode;
pub mod peaks;
pub mod track;
