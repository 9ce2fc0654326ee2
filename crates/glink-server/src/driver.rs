//! The resolved driver dispatch table.
//!
//! One method per forwarded entry point. A production implementation wraps
//! function pointers resolved from the platform's EGL/GLES libraries; that
//! resolution is outside this crate. Object-name parameters here are *real*
//! driver names; the dispatcher translates virtual names before invoking.

use glink_protocol::{ContextId, DisplayId, Namespace, SurfaceId};

pub trait GlDriver {
    // Context / surface lifecycle. Boolean results follow EGL conventions.
    fn make_current(
        &mut self,
        display: DisplayId,
        draw: SurfaceId,
        read: SurfaceId,
        context: ContextId,
    ) -> bool;
    fn destroy_context(&mut self, display: DisplayId, context: ContextId) -> bool;
    fn destroy_surface(&mut self, display: DisplayId, surface: SurfaceId) -> bool;
    fn terminate(&mut self, display: DisplayId) -> bool;
    fn release_thread(&mut self) -> bool;

    /// Create `count` fresh driver names. Must return exactly `count` names.
    fn gen_objects(&mut self, namespace: Namespace, count: usize) -> Vec<u32>;
    fn delete_objects(&mut self, namespace: Namespace, names: &[u32]);
    fn create_shader(&mut self, kind: u32) -> u32;
    fn create_program(&mut self) -> u32;
    fn delete_shader(&mut self, shader: u32);
    fn delete_program(&mut self, program: u32);
    fn shader_source(&mut self, shader: u32, source: &str);
    fn compile_shader(&mut self, shader: u32);
    fn attach_shader(&mut self, program: u32, shader: u32);
    fn link_program(&mut self, program: u32);

    fn bind_buffer(&mut self, target: u32, buffer: u32);
    fn bind_texture(&mut self, target: u32, texture: u32);
    fn bind_framebuffer(&mut self, target: u32, framebuffer: u32);
    fn bind_renderbuffer(&mut self, target: u32, renderbuffer: u32);

    fn active_texture(&mut self, unit: u32);
    fn blend_color(&mut self, color: [f32; 4]);
    fn blend_equation(&mut self, mode: u32);
    fn blend_func(&mut self, src: u32, dst: u32);
    fn clear_color(&mut self, color: [f32; 4]);
    fn clear_depthf(&mut self, depth: f32);
    fn clear_stencil(&mut self, stencil: i32);
    fn color_mask(&mut self, mask: [bool; 4]);
    fn cull_face(&mut self, mode: u32);
    fn depth_func(&mut self, func: u32);
    fn depth_mask(&mut self, flag: bool);
    fn depth_rangef(&mut self, near: f32, far: f32);
    /// `Enable`/`Disable`, folded into one hook.
    fn set_capability(&mut self, cap: u32, enabled: bool);
    fn front_face(&mut self, mode: u32);
    fn line_width(&mut self, width: f32);
    fn pixel_storei(&mut self, pname: u32, param: i32);
    fn polygon_offset(&mut self, factor: f32, units: f32);
    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn stencil_func(&mut self, func: u32, reference: i32, mask: u32);
    fn stencil_mask(&mut self, mask: u32);
    fn use_program(&mut self, program: u32);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    #[allow(clippy::too_many_arguments)]
    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: u64,
    );
    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);

    fn buffer_data(&mut self, target: u32, data: &[u8], usage: u32);
    fn buffer_sub_data(&mut self, target: u32, offset: u64, data: &[u8]);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        ty: u32,
        pixels: Option<&[u8]>,
    );
    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        xoffset: i32,
        yoffset: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: &[u8],
    );

    fn clear(&mut self, mask: u32);
    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32);
    fn draw_elements(&mut self, mode: u32, count: i32, ty: u32, offset: u64);
    fn flush(&mut self);
    fn finish(&mut self);

    fn get_error(&mut self) -> u32;
    fn get_integerv(&mut self, pname: u32) -> Vec<i32>;
}
