//! Shared recording driver for dispatcher tests.
#![allow(dead_code)]

use glink_protocol::{glenum, ContextId, DisplayId, Namespace, SurfaceId};
use glink_server::GlDriver;
use std::sync::{Arc, Mutex};

struct Inner {
    log: Vec<String>,
    next_real: u32,
    next_shader: u32,
    /// Scripted results for the next `get_error` calls.
    pending_errors: Vec<u32>,
    /// Real names passed to `bind_buffer`, in call order.
    bound_buffers: Vec<u32>,
}

/// A `GlDriver` that records every invocation. Cloning shares the log, so a
/// test can keep a handle while the dispatcher owns the driver.
#[derive(Clone)]
pub struct RecordingDriver {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                log: Vec::new(),
                next_real: 1000,
                next_shader: 1,
                pending_errors: Vec::new(),
                bound_buffers: Vec::new(),
            })),
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.inner.lock().unwrap().log.clone()
    }

    /// Number of recorded calls whose entry starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn bound_buffers(&self) -> Vec<u32> {
        self.inner.lock().unwrap().bound_buffers.clone()
    }

    /// Script the result of the next driver-side error query.
    pub fn push_error(&self, error: u32) {
        self.inner.lock().unwrap().pending_errors.push(error);
    }

    fn record(&self, entry: String) {
        self.inner.lock().unwrap().log.push(entry);
    }
}

impl GlDriver for RecordingDriver {
    fn make_current(
        &mut self,
        display: DisplayId,
        _draw: SurfaceId,
        _read: SurfaceId,
        context: ContextId,
    ) -> bool {
        self.record(format!("make_current({:#x}, {:#x})", display.0, context.0));
        true
    }

    fn destroy_context(&mut self, display: DisplayId, context: ContextId) -> bool {
        self.record(format!("destroy_context({:#x}, {:#x})", display.0, context.0));
        true
    }

    fn destroy_surface(&mut self, display: DisplayId, surface: SurfaceId) -> bool {
        self.record(format!("destroy_surface({:#x}, {:#x})", display.0, surface.0));
        true
    }

    fn terminate(&mut self, display: DisplayId) -> bool {
        self.record(format!("terminate({:#x})", display.0));
        true
    }

    fn release_thread(&mut self) -> bool {
        self.record("release_thread()".to_owned());
        true
    }

    fn gen_objects(&mut self, namespace: Namespace, count: usize) -> Vec<u32> {
        self.record(format!("gen_objects({namespace:?}, {count})"));
        let mut inner = self.inner.lock().unwrap();
        (0..count)
            .map(|_| {
                inner.next_real += 1;
                inner.next_real
            })
            .collect()
    }

    fn delete_objects(&mut self, namespace: Namespace, names: &[u32]) {
        self.record(format!("delete_objects({namespace:?}, {names:?})"));
    }

    fn create_shader(&mut self, kind: u32) -> u32 {
        self.record(format!("create_shader({kind:#x})"));
        let mut inner = self.inner.lock().unwrap();
        inner.next_shader += 1;
        inner.next_shader
    }

    fn create_program(&mut self) -> u32 {
        self.record("create_program()".to_owned());
        let mut inner = self.inner.lock().unwrap();
        inner.next_shader += 1;
        inner.next_shader
    }

    fn delete_shader(&mut self, shader: u32) {
        self.record(format!("delete_shader({shader})"));
    }

    fn delete_program(&mut self, program: u32) {
        self.record(format!("delete_program({program})"));
    }

    fn shader_source(&mut self, shader: u32, source: &str) {
        self.record(format!("shader_source({shader}, {} bytes)", source.len()));
    }

    fn compile_shader(&mut self, shader: u32) {
        self.record(format!("compile_shader({shader})"));
    }

    fn attach_shader(&mut self, program: u32, shader: u32) {
        self.record(format!("attach_shader({program}, {shader})"));
    }

    fn link_program(&mut self, program: u32) {
        self.record(format!("link_program({program})"));
    }

    fn bind_buffer(&mut self, target: u32, buffer: u32) {
        self.record(format!("bind_buffer({target:#x}, {buffer})"));
        self.inner.lock().unwrap().bound_buffers.push(buffer);
    }

    fn bind_texture(&mut self, target: u32, texture: u32) {
        self.record(format!("bind_texture({target:#x}, {texture})"));
    }

    fn bind_framebuffer(&mut self, target: u32, framebuffer: u32) {
        self.record(format!("bind_framebuffer({target:#x}, {framebuffer})"));
    }

    fn bind_renderbuffer(&mut self, target: u32, renderbuffer: u32) {
        self.record(format!("bind_renderbuffer({target:#x}, {renderbuffer})"));
    }

    fn active_texture(&mut self, unit: u32) {
        self.record(format!("active_texture({unit:#x})"));
    }

    fn blend_color(&mut self, color: [f32; 4]) {
        self.record(format!("blend_color({color:?})"));
    }

    fn blend_equation(&mut self, mode: u32) {
        self.record(format!("blend_equation({mode:#x})"));
    }

    fn blend_func(&mut self, src: u32, dst: u32) {
        self.record(format!("blend_func({src:#x}, {dst:#x})"));
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.record(format!("clear_color({color:?})"));
    }

    fn clear_depthf(&mut self, depth: f32) {
        self.record(format!("clear_depthf({depth})"));
    }

    fn clear_stencil(&mut self, stencil: i32) {
        self.record(format!("clear_stencil({stencil})"));
    }

    fn color_mask(&mut self, mask: [bool; 4]) {
        self.record(format!("color_mask({mask:?})"));
    }

    fn cull_face(&mut self, mode: u32) {
        self.record(format!("cull_face({mode:#x})"));
    }

    fn depth_func(&mut self, func: u32) {
        self.record(format!("depth_func({func:#x})"));
    }

    fn depth_mask(&mut self, flag: bool) {
        self.record(format!("depth_mask({flag})"));
    }

    fn depth_rangef(&mut self, near: f32, far: f32) {
        self.record(format!("depth_rangef({near}, {far})"));
    }

    fn set_capability(&mut self, cap: u32, enabled: bool) {
        self.record(format!("set_capability({cap:#x}, {enabled})"));
    }

    fn front_face(&mut self, mode: u32) {
        self.record(format!("front_face({mode:#x})"));
    }

    fn line_width(&mut self, width: f32) {
        self.record(format!("line_width({width})"));
    }

    fn pixel_storei(&mut self, pname: u32, param: i32) {
        self.record(format!("pixel_storei({pname:#x}, {param})"));
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.record(format!("polygon_offset({factor}, {units})"));
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(format!("scissor({x}, {y}, {width}, {height})"));
    }

    fn stencil_func(&mut self, func: u32, reference: i32, mask: u32) {
        self.record(format!("stencil_func({func:#x}, {reference}, {mask:#x})"));
    }

    fn stencil_mask(&mut self, mask: u32) {
        self.record(format!("stencil_mask({mask:#x})"));
    }

    fn use_program(&mut self, program: u32) {
        self.record(format!("use_program({program})"));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(format!("viewport({x}, {y}, {width}, {height})"));
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: u64,
    ) {
        self.record(format!(
            "vertex_attrib_pointer({index}, {size}, {ty:#x}, {normalized}, {stride}, {offset})"
        ));
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.record(format!("enable_vertex_attrib_array({index})"));
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.record(format!("disable_vertex_attrib_array({index})"));
    }

    fn buffer_data(&mut self, target: u32, data: &[u8], usage: u32) {
        self.record(format!(
            "buffer_data({target:#x}, {} bytes, {usage:#x})",
            data.len()
        ));
    }

    fn buffer_sub_data(&mut self, target: u32, offset: u64, data: &[u8]) {
        self.record(format!(
            "buffer_sub_data({target:#x}, {offset}, {} bytes)",
            data.len()
        ));
    }

    fn tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        _internal_format: u32,
        width: i32,
        height: i32,
        _border: i32,
        _format: u32,
        _ty: u32,
        pixels: Option<&[u8]>,
    ) {
        self.record(format!(
            "tex_image_2d({target:#x}, {level}, {width}x{height}, {:?} bytes)",
            pixels.map(|p| p.len())
        ));
    }

    fn tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        xoffset: i32,
        yoffset: i32,
        width: i32,
        height: i32,
        _format: u32,
        _ty: u32,
        pixels: &[u8],
    ) {
        self.record(format!(
            "tex_sub_image_2d({target:#x}, {level}, {xoffset},{yoffset} {width}x{height}, {} bytes)",
            pixels.len()
        ));
    }

    fn clear(&mut self, mask: u32) {
        self.record(format!("clear({mask:#x})"));
    }

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) {
        self.record(format!("draw_arrays({mode:#x}, {first}, {count})"));
    }

    fn draw_elements(&mut self, mode: u32, count: i32, ty: u32, offset: u64) {
        self.record(format!("draw_elements({mode:#x}, {count}, {ty:#x}, {offset})"));
    }

    fn flush(&mut self) {
        self.record("flush()".to_owned());
    }

    fn finish(&mut self) {
        self.record("finish()".to_owned());
    }

    fn get_error(&mut self) -> u32 {
        self.record("get_error()".to_owned());
        let mut inner = self.inner.lock().unwrap();
        if inner.pending_errors.is_empty() {
            glenum::NO_ERROR
        } else {
            inner.pending_errors.remove(0)
        }
    }

    fn get_integerv(&mut self, pname: u32) -> Vec<i32> {
        self.record(format!("get_integerv({pname:#x})"));
        match pname {
            glenum::MAX_TEXTURE_SIZE => vec![4096],
            glenum::MAX_VERTEX_ATTRIBS => vec![16],
            _ => vec![0],
        }
    }
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self::new()
    }
}
