pub mod frame_uniform;
pub mod imgui_renderer;
pub mod passes;
pub mod post_process;
pub mod render_common;
pub mod render_object;
pub mod renderer;
pub mod shader_loader;
pub mod text_renderer;
pub mod texture;
