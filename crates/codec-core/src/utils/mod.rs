//! Utility functions shared by the transcoders

pub mod pcm;
pub mod validation;

pub use pcm::{pack_block_le, pack_i16_le, unpack_block_le, unpack_i16_le};
