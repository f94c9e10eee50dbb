//! Textured quads: plain sprites, frame animations and scrolling
//! backgrounds. All three register in the world's draw list while attached.

use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3};

use lumen_ecs::actor::ActorContext;
use lumen_ecs::component::{Component, ComponentId};
use lumen_ecs::draw::{DrawOrder, Drawable, RenderTarget};
use lumen_ecs::transform::Transform;

use crate::assets::Texture;

pub const DEFAULT_DRAW_ORDER: DrawOrder = 100;
/// Backgrounds sit behind regular sprites.
pub const DEFAULT_BG_DRAW_ORDER: DrawOrder = 10;
pub const DEFAULT_ANIM_FPS: f32 = 24.0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpriteError {
    #[error("animation {index} is not defined ({count} available)")]
    UnknownAnimation { index: usize, count: usize },
}

/// Draws one texture at its owner's transform, scaled to the texture's
/// pixel size. Registers itself in the world's draw list while attached.
#[derive(Debug, Clone)]
pub struct SpriteComponent {
    texture: Option<Rc<Texture>>,
    draw_order: DrawOrder,
}

impl SpriteComponent {
    pub fn new(draw_order: DrawOrder) -> Self {
        Self {
            texture: None,
            draw_order,
        }
    }

    pub fn with_texture(mut self, texture: Option<Rc<Texture>>) -> Self {
        self.texture = texture;
        self
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_deref()
    }

    pub fn set_texture(&mut self, texture: Option<Rc<Texture>>) {
        self.texture = texture;
    }

    pub fn draw_order(&self) -> DrawOrder {
        self.draw_order
    }

    /// The matrix the sprite is drawn with.
    pub fn sprite_transform(owner: &Transform, texture: &Texture) -> Mat4 {
        let size = Mat4::from_scale(Vec3::new(texture.width as f32, texture.height as f32, 1.0));
        *owner.world_transform() * size
    }
}

impl Default for SpriteComponent {
    fn default() -> Self {
        Self::new(DEFAULT_DRAW_ORDER)
    }
}

impl Component for SpriteComponent {
    fn on_attach(&mut self, ctx: &mut ActorContext<'_>, id: ComponentId) {
        let owner = ctx.id();
        ctx.world_mut().draw_list_mut().add(self.draw_order, owner, id);
    }

    fn on_detach(&mut self, ctx: &mut ActorContext<'_>, id: ComponentId) {
        let owner = ctx.id();
        ctx.world_mut().draw_list_mut().remove(owner, id);
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }
}

impl Drawable for SpriteComponent {
    /// Without a texture there is nothing to draw.
    fn draw(&self, owner: &Transform, target: &mut dyn RenderTarget) {
        if let Some(texture) = &self.texture {
            target.draw_quad(texture.id, &Self::sprite_transform(owner, texture));
        }
    }
}

// ---------------------------------------------------------------------------
// AnimSpriteComponent
// ---------------------------------------------------------------------------

/// A named slice of the frame list: frames `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    pub start: usize,
    pub end: usize,
    pub looping: bool,
}

impl Animation {
    pub fn new(start: usize, end: usize, looping: bool) -> Self {
        assert!(start <= end, "animation range {start}..={end} is reversed");
        Self { start, end, looping }
    }

    fn len(&self) -> f32 {
        (self.end - self.start + 1) as f32
    }
}

/// A sprite that flips through a list of frame textures at `anim_fps`.
///
/// Until an animation is appended the whole frame list plays as one
/// looping animation. A looping animation wraps back to its first frame
/// past the end, a non-looping one holds its last frame.
#[derive(Debug, Clone)]
pub struct AnimSpriteComponent {
    sprite: SpriteComponent,
    frames: Vec<Rc<Texture>>,
    animations: Vec<Animation>,
    current_animation: usize,
    current_frame: f32,
    anim_fps: f32,
}

impl AnimSpriteComponent {
    pub fn new(draw_order: DrawOrder) -> Self {
        Self {
            sprite: SpriteComponent::new(draw_order),
            frames: Vec::new(),
            animations: Vec::new(),
            current_animation: 0,
            current_frame: 0.0,
            anim_fps: DEFAULT_ANIM_FPS,
        }
    }

    /// Replaces the frame list and shows the first frame of the current
    /// animation.
    pub fn set_frames(&mut self, frames: Vec<Rc<Texture>>) {
        self.frames = frames;
        self.current_frame = self.animation().start as f32;
        self.refresh_texture();
    }

    pub fn append_animation(&mut self, animation: Animation) -> usize {
        self.animations.push(animation);
        self.animations.len() - 1
    }

    /// Switches to a previously appended animation and rewinds to its
    /// first frame.
    pub fn set_animation(&mut self, index: usize) -> Result<(), SpriteError> {
        if index >= self.animations.len() {
            return Err(SpriteError::UnknownAnimation {
                index,
                count: self.animations.len(),
            });
        }
        self.current_animation = index;
        self.current_frame = self.animations[index].start as f32;
        self.refresh_texture();
        Ok(())
    }

    pub fn anim_fps(&self) -> f32 {
        self.anim_fps
    }

    pub fn set_anim_fps(&mut self, fps: f32) {
        self.anim_fps = fps;
    }

    /// Index into the frame list of the frame currently shown.
    pub fn current_frame(&self) -> usize {
        self.current_frame as usize
    }

    pub fn sprite(&self) -> &SpriteComponent {
        &self.sprite
    }

    /// The running animation, or the implicit whole-list loop.
    pub fn animation(&self) -> Animation {
        self.animations
            .get(self.current_animation)
            .copied()
            .unwrap_or(Animation {
                start: 0,
                end: self.frames.len().saturating_sub(1),
                looping: true,
            })
    }

    /// Advances the frame counter by `anim_fps * dt`.
    pub fn advance(&mut self, dt: f32) {
        if self.frames.is_empty() {
            return;
        }
        let animation = self.animation();
        self.current_frame += self.anim_fps * dt;
        if self.current_frame as usize > animation.end {
            self.current_frame = if animation.looping {
                let start = animation.start as f32;
                start + (self.current_frame - start) % animation.len()
            } else {
                animation.end as f32
            };
        }
        self.refresh_texture();
    }

    fn refresh_texture(&mut self) {
        let frame = self.frames.get(self.current_frame()).cloned();
        self.sprite.set_texture(frame);
    }
}

impl Default for AnimSpriteComponent {
    fn default() -> Self {
        Self::new(DEFAULT_DRAW_ORDER)
    }
}

impl Component for AnimSpriteComponent {
    fn update(&mut self, _ctx: &mut ActorContext<'_>, dt: f32) {
        self.advance(dt);
    }

    fn on_attach(&mut self, ctx: &mut ActorContext<'_>, id: ComponentId) {
        self.sprite.on_attach(ctx, id);
    }

    fn on_detach(&mut self, ctx: &mut ActorContext<'_>, id: ComponentId) {
        self.sprite.on_detach(ctx, id);
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }
}

impl Drawable for AnimSpriteComponent {
    fn draw(&self, owner: &Transform, target: &mut dyn RenderTarget) {
        self.sprite.draw(owner, target);
    }
}

// ---------------------------------------------------------------------------
// BGSpriteComponent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct BgLayer {
    texture: Rc<Texture>,
    offset: Vec2,
}

/// Screen-sized textures laid side by side and scrolled horizontally.
///
/// Layers start at `offset.x = i * screen width`. A layer that scrolls fully
/// off the left edge jumps behind the last one, so the strip repeats.
#[derive(Debug, Clone)]
pub struct BGSpriteComponent {
    layers: Vec<BgLayer>,
    screen_size: Vec2,
    scroll_speed: f32,
    draw_order: DrawOrder,
}

impl BGSpriteComponent {
    pub fn new(draw_order: DrawOrder, screen_size: Vec2) -> Self {
        Self {
            layers: Vec::new(),
            screen_size,
            scroll_speed: 0.0,
            draw_order,
        }
    }

    pub fn with_scroll_speed(mut self, speed: f32) -> Self {
        self.scroll_speed = speed;
        self
    }

    pub fn set_textures(&mut self, textures: Vec<Rc<Texture>>) {
        let width = self.screen_size.x;
        self.layers = textures
            .into_iter()
            .enumerate()
            .map(|(i, texture)| BgLayer {
                texture,
                offset: Vec2::new(i as f32 * width, 0.0),
            })
            .collect();
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }

    pub fn set_screen_size(&mut self, size: Vec2) {
        self.screen_size = size;
    }

    pub fn scroll_speed(&self) -> f32 {
        self.scroll_speed
    }

    pub fn set_scroll_speed(&mut self, speed: f32) {
        self.scroll_speed = speed;
    }

    pub fn draw_order(&self) -> DrawOrder {
        self.draw_order
    }

    /// Current layer offsets relative to the owner, in layer order.
    pub fn offsets(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.layers.iter().map(|layer| layer.offset)
    }

    /// Moves every layer by `scroll_speed * dt` and wraps the ones that left
    /// the screen.
    pub fn scroll(&mut self, dt: f32) {
        let width = self.screen_size.x;
        let span = self.layers.len() as f32 * width;
        for layer in &mut self.layers {
            layer.offset.x += self.scroll_speed * dt;
            if layer.offset.x < -width {
                layer.offset.x += span;
            }
        }
    }
}

impl Component for BGSpriteComponent {
    fn update(&mut self, _ctx: &mut ActorContext<'_>, dt: f32) {
        self.scroll(dt);
    }

    fn on_attach(&mut self, ctx: &mut ActorContext<'_>, id: ComponentId) {
        let owner = ctx.id();
        ctx.world_mut().draw_list_mut().add(self.draw_order, owner, id);
    }

    fn on_detach(&mut self, ctx: &mut ActorContext<'_>, id: ComponentId) {
        let owner = ctx.id();
        ctx.world_mut().draw_list_mut().remove(owner, id);
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }
}

impl Drawable for BGSpriteComponent {
    /// Layers ignore the owner's rotation and scale and always cover one
    /// screen.
    fn draw(&self, owner: &Transform, target: &mut dyn RenderTarget) {
        let origin = owner.world_transform().w_axis.truncate();
        let size = Mat4::from_scale(self.screen_size.extend(1.0));
        for layer in &self.layers {
            let at = Mat4::from_translation(origin + layer.offset.extend(0.0));
            target.draw_quad(layer.texture.id, &(at * size));
        }
    }
}
