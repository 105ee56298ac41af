pub mod bloom_pass;
pub mod effect_pass;
pub mod scene_pass;
