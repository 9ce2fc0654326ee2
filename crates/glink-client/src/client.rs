//! The client object and the generic cached-remote-call submit path.

use crate::schema::{call_spec, SyncMode};
use glink_protocol::{glenum, image_data_size, Command, Namespace, Reply};
use glink_ring::RingProducer;
use glink_state::{ContextRegistry, GlMirror, SharedNamePools};
use tracing::warn;

/// Issuing-side handle for one client thread.
///
/// Owns this thread's transport producer and context registry; shares the
/// process-wide virtual name pools with every other client thread. All state
/// is explicit, with no globals and no thread-locals: a thread simply owns
/// its `GlesClient`.
pub struct GlesClient {
    pub(crate) producer: RingProducer,
    pub(crate) registry: ContextRegistry<GlMirror>,
    names: SharedNamePools,
}

impl GlesClient {
    pub fn new(producer: RingProducer, names: SharedNamePools) -> Self {
        Self {
            producer,
            registry: ContextRegistry::new(),
            names,
        }
    }

    /// Number of context records this client currently tracks.
    pub fn tracked_contexts(&self) -> usize {
        self.registry.len()
    }

    pub fn has_current_context(&self) -> bool {
        self.registry.active_slot().is_some()
    }

    /// The generic remoted-call pattern. Every entry point without a return
    /// value funnels through here.
    ///
    /// Calls with no active context are dropped without recording an error,
    /// matching the underlying API's undefined behavior for that case.
    pub(crate) fn issue(&mut self, cmd: Command) {
        let Some(record) = self.registry.active_mut() else {
            return;
        };
        let mirror = &mut record.state;

        if let Err(error) = mirror.validate(&cmd) {
            mirror.record_error(error);
            return;
        }
        if mirror.is_redundant(&cmd) {
            return;
        }
        mirror.apply(&cmd);

        let payload = cmd.encode_payload();
        if payload.len() > self.producer.max_payload_bytes() {
            // Only reachable for uploads; state setters are tiny.
            mirror.record_error(glenum::OUT_OF_MEMORY);
            return;
        }

        let spec = call_spec(&cmd);
        if spec.defer_error {
            mirror.needs_driver_query = true;
        }
        match spec.sync {
            SyncMode::Async => {
                self.producer.post(cmd.opcode(), &payload);
            }
            SyncMode::Sync => {
                if let Err(err) = self.producer.call(cmd.opcode(), &payload) {
                    warn!(?err, opcode = cmd.opcode(), "synchronous record failed");
                }
            }
        }
    }

    pub(crate) fn call_reply(&mut self, cmd: &Command) -> Option<Reply> {
        match self.producer.call(cmd.opcode(), &cmd.encode_payload()) {
            Ok(bytes) => match Reply::decode(&bytes) {
                Ok(reply) => Some(reply),
                Err(err) => {
                    warn!(%err, opcode = cmd.opcode(), "malformed reply");
                    None
                }
            },
            Err(err) => {
                warn!(?err, opcode = cmd.opcode(), "synchronous call failed");
                None
            }
        }
    }

    // --- Cached state setters -------------------------------------------

    pub fn active_texture(&mut self, unit: u32) {
        self.issue(Command::ActiveTexture { unit });
    }

    pub fn bind_buffer(&mut self, target: u32, buffer: u32) {
        self.issue(Command::BindBuffer { target, buffer });
    }

    pub fn bind_texture(&mut self, target: u32, texture: u32) {
        self.issue(Command::BindTexture { target, texture });
    }

    pub fn bind_framebuffer(&mut self, target: u32, framebuffer: u32) {
        self.issue(Command::BindFramebuffer {
            target,
            framebuffer,
        });
    }

    pub fn bind_renderbuffer(&mut self, target: u32, renderbuffer: u32) {
        self.issue(Command::BindRenderbuffer {
            target,
            renderbuffer,
        });
    }

    pub fn blend_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.issue(Command::BlendColor {
            color: [red, green, blue, alpha],
        });
    }

    pub fn blend_equation(&mut self, mode: u32) {
        self.issue(Command::BlendEquation { mode });
    }

    pub fn blend_func(&mut self, src: u32, dst: u32) {
        self.issue(Command::BlendFunc { src, dst });
    }

    pub fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.issue(Command::ClearColor {
            color: [red, green, blue, alpha],
        });
    }

    pub fn clear_depthf(&mut self, depth: f32) {
        self.issue(Command::ClearDepth { depth });
    }

    pub fn clear_stencil(&mut self, stencil: i32) {
        self.issue(Command::ClearStencil { stencil });
    }

    pub fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.issue(Command::ColorMask {
            mask: [red, green, blue, alpha],
        });
    }

    pub fn cull_face(&mut self, mode: u32) {
        self.issue(Command::CullFace { mode });
    }

    pub fn depth_func(&mut self, func: u32) {
        self.issue(Command::DepthFunc { func });
    }

    pub fn depth_mask(&mut self, flag: bool) {
        self.issue(Command::DepthMask { flag });
    }

    pub fn depth_rangef(&mut self, near: f32, far: f32) {
        self.issue(Command::DepthRange { near, far });
    }

    pub fn disable(&mut self, cap: u32) {
        self.issue(Command::Disable { cap });
    }

    pub fn enable(&mut self, cap: u32) {
        self.issue(Command::Enable { cap });
    }

    pub fn front_face(&mut self, mode: u32) {
        self.issue(Command::FrontFace { mode });
    }

    pub fn line_width(&mut self, width: f32) {
        self.issue(Command::LineWidth { width });
    }

    pub fn pixel_storei(&mut self, pname: u32, param: i32) {
        self.issue(Command::PixelStore { pname, param });
    }

    pub fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.issue(Command::PolygonOffset { factor, units });
    }

    pub fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.issue(Command::Scissor {
            x,
            y,
            width,
            height,
        });
    }

    pub fn stencil_func(&mut self, func: u32, reference: i32, mask: u32) {
        self.issue(Command::StencilFunc {
            func,
            reference,
            mask,
        });
    }

    pub fn stencil_mask(&mut self, mask: u32) {
        self.issue(Command::StencilMask { mask });
    }

    pub fn use_program(&mut self, program: u32) {
        self.issue(Command::UseProgram { program });
    }

    pub fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.issue(Command::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    pub fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: u64,
    ) {
        self.issue(Command::VertexAttribPointer {
            index,
            size,
            ty,
            normalized,
            stride,
            offset,
        });
    }

    pub fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.issue(Command::EnableVertexAttribArray { index });
    }

    pub fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.issue(Command::DisableVertexAttribArray { index });
    }

    // --- Object management ----------------------------------------------

    pub fn gen_buffers(&mut self, n: usize) -> Vec<u32> {
        self.gen_objects(Namespace::Buffer, n)
    }

    pub fn gen_textures(&mut self, n: usize) -> Vec<u32> {
        self.gen_objects(Namespace::Texture, n)
    }

    pub fn gen_framebuffers(&mut self, n: usize) -> Vec<u32> {
        self.gen_objects(Namespace::Framebuffer, n)
    }

    pub fn gen_renderbuffers(&mut self, n: usize) -> Vec<u32> {
        self.gen_objects(Namespace::Renderbuffer, n)
    }

    pub fn delete_buffers(&mut self, names: &[u32]) {
        self.delete_objects(Namespace::Buffer, names);
    }

    pub fn delete_textures(&mut self, names: &[u32]) {
        self.delete_objects(Namespace::Texture, names);
    }

    pub fn delete_framebuffers(&mut self, names: &[u32]) {
        self.delete_objects(Namespace::Framebuffer, names);
    }

    pub fn delete_renderbuffers(&mut self, names: &[u32]) {
        self.delete_objects(Namespace::Renderbuffer, names);
    }

    /// Mint virtual names and synchronously register them with the server so
    /// the mappings exist before this returns. With no active context the
    /// call is dropped and returns no names.
    fn gen_objects(&mut self, namespace: Namespace, n: usize) -> Vec<u32> {
        if self.registry.active_slot().is_none() {
            return Vec::new();
        }
        let names = self
            .names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .alloc(namespace, n);
        let cmd = Command::GenObjects {
            namespace,
            names: names.clone(),
        };
        let _ = self.call_reply(&cmd);
        names
    }

    fn delete_objects(&mut self, namespace: Namespace, names: &[u32]) {
        if self.registry.active_slot().is_none() {
            return;
        }
        self.issue(Command::DeleteObjects {
            namespace,
            names: names.to_vec(),
        });
        // Deleted names become eligible for reuse before new ones are minted.
        self.names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .release(namespace, names);
    }

    pub fn create_shader(&mut self, kind: u32) -> u32 {
        let cmd = Command::CreateShader { kind };
        let Some(record) = self.registry.active_mut() else {
            return 0;
        };
        if let Err(error) = record.state.validate(&cmd) {
            record.state.record_error(error);
            return 0;
        }
        match self.call_reply(&cmd) {
            Some(Reply::Uint(id)) => id,
            _ => 0,
        }
    }

    pub fn create_program(&mut self) -> u32 {
        if self.registry.active_slot().is_none() {
            return 0;
        }
        match self.call_reply(&Command::CreateProgram) {
            Some(Reply::Uint(id)) => id,
            _ => 0,
        }
    }

    pub fn delete_shader(&mut self, shader: u32) {
        self.issue(Command::DeleteShader { shader });
    }

    pub fn delete_program(&mut self, program: u32) {
        self.issue(Command::DeleteProgram { program });
    }

    pub fn shader_source(&mut self, shader: u32, source: &str) {
        self.issue(Command::ShaderSource {
            shader,
            source: source.to_owned(),
        });
    }

    pub fn compile_shader(&mut self, shader: u32) {
        self.issue(Command::CompileShader { shader });
    }

    pub fn attach_shader(&mut self, program: u32, shader: u32) {
        self.issue(Command::AttachShader { program, shader });
    }

    pub fn link_program(&mut self, program: u32) {
        self.issue(Command::LinkProgram { program });
    }

    // --- Data uploads ----------------------------------------------------

    pub fn buffer_data(&mut self, target: u32, data: &[u8], usage: u32) {
        self.issue(Command::BufferData {
            target,
            usage,
            data: data.to_vec(),
        });
    }

    pub fn buffer_sub_data(&mut self, target: u32, offset: u64, data: &[u8]) {
        self.issue(Command::BufferSubData {
            target,
            offset,
            data: data.to_vec(),
        });
    }

    /// Upload a texture image. `pixels: None` reserves storage without data.
    ///
    /// The heap copy is sized by the pixel utility under the mirrored unpack
    /// alignment; a size overflow (or a caller buffer smaller than the
    /// computed size) is a hard failure of the call and no record is sent.
    #[allow(clippy::too_many_arguments)]
    pub fn tex_image_2d(
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
    ) {
        let Some(pixels) = self.copy_pixels(width, height, format, ty, pixels) else {
            return;
        };
        self.issue(Command::TexImage2d {
            target,
            level,
            internal_format,
            width,
            height,
            border,
            format,
            ty,
            pixels,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tex_sub_image_2d(
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
    ) {
        let Some(Some(pixels)) = self
            .copy_pixels(width, height, format, ty, Some(pixels))
        else {
            return;
        };
        self.issue(Command::TexSubImage2d {
            target,
            level,
            xoffset,
            yoffset,
            width,
            height,
            format,
            ty,
            pixels,
        });
    }

    /// Size and copy a caller pixel buffer. `None` means the call must be
    /// dropped (an error was recorded); `Some(None)` means a null upload.
    fn copy_pixels(
        &mut self,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: Option<&[u8]>,
    ) -> Option<Option<Vec<u8>>> {
        let record = self.registry.active_mut()?;
        let Some(data) = pixels else {
            return Some(None);
        };
        if width < 0 || height < 0 {
            record.state.record_error(glenum::INVALID_VALUE);
            return None;
        }
        let alignment = record.state.unpack_alignment;
        match image_data_size(width as u32, height as u32, format, ty, alignment) {
            Ok(size) if data.len() >= size.total as usize => {
                Some(Some(data[..size.total as usize].to_vec()))
            }
            Ok(_) | Err(_) => {
                record.state.record_error(glenum::INVALID_VALUE);
                None
            }
        }
    }

    // --- Drawing and ordering -------------------------------------------

    pub fn clear(&mut self, mask: u32) {
        self.issue(Command::Clear { mask });
    }

    pub fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) {
        self.issue(Command::DrawArrays { mode, first, count });
    }

    pub fn draw_elements(&mut self, mode: u32, count: i32, ty: u32, offset: u64) {
        self.issue(Command::DrawElements {
            mode,
            count,
            ty,
            offset,
        });
    }

    pub fn flush(&mut self) {
        self.issue(Command::Flush);
    }

    /// Blocks until every record issued by this thread has executed.
    pub fn finish(&mut self) {
        self.issue(Command::Finish);
    }

    // --- Queries ---------------------------------------------------------

    /// The write-back single-slot error cache.
    ///
    /// When the mirror knows no forwarded call could have failed driver-side,
    /// the sticky local error is returned (and cleared) without a round-trip.
    /// Otherwise the query goes to the real driver and clears both the flag
    /// and the sticky slot. First error wins either way.
    pub fn get_error(&mut self) -> u32 {
        if self.registry.active_slot().is_none() {
            return glenum::INVALID_OPERATION;
        }
        let needs_driver = self
            .registry
            .active()
            .map_or(false, |r| r.state.needs_driver_query);
        if !needs_driver {
            return self
                .registry
                .active_mut()
                .map_or(glenum::NO_ERROR, |r| r.state.take_error());
        }

        let driver_error = match self.call_reply(&Command::GetError) {
            Some(Reply::Uint(error)) => error,
            _ => glenum::NO_ERROR,
        };
        if let Some(record) = self.registry.active_mut() {
            record.state.needs_driver_query = false;
            record.state.take_error();
        }
        driver_error
    }

    /// Integer state query, answered locally whenever the mirror can.
    /// Implementation limits are fetched once and cached.
    pub fn get_integerv(&mut self, pname: u32) -> Vec<i32> {
        if self.registry.active_slot().is_none() {
            return Vec::new();
        }
        if let Some(values) = self
            .registry
            .active()
            .and_then(|r| r.state.local_integer(pname))
        {
            return values;
        }

        let values = match self.call_reply(&Command::GetInteger { pname }) {
            Some(Reply::Ints(values)) => values,
            _ => Vec::new(),
        };
        if let (Some(record), Some(&first)) = (self.registry.active_mut(), values.first()) {
            record.state.cache_limit(pname, first);
        }
        values
    }
}
