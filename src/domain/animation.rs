/// Frame-based looping animation.
///
/// Images are opaque handles: the simulation only needs their pixel size
/// for collision, and the render backend resolves `(key, frame)` to
/// whatever it actually draws.

/// Which source image a frame was cut from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ImageKey {
    Bird,
    Alien,
    Dot,
    Cloud,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Image {
    pub key: ImageKey,
    /// Index within the source sheet (0 for single images).
    pub frame: u16,
    pub width: i32,
    pub height: i32,
}

impl Image {
    pub fn new(key: ImageKey, frame: u16, width: i32, height: i32) -> Self {
        Image { key, frame, width, height }
    }
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    image: Image,
    /// Animation time at which this frame ends (cumulative).
    end_time: f32,
}

/// An ordered, non-empty list of frames played in a loop.
#[derive(Clone, Debug)]
pub struct Animation {
    frames: Vec<Frame>,
    current: usize,
    clock: f32,
    total: f32,
}

impl Animation {
    /// Start an animation with its first frame.
    pub fn new(image: Image, duration_ms: f32) -> Self {
        let duration = duration_ms.max(0.0);
        Animation {
            frames: vec![Frame { image, end_time: duration }],
            current: 0,
            clock: 0.0,
            total: duration,
        }
    }

    /// Append a frame shown for `duration_ms`.
    pub fn with_frame(mut self, image: Image, duration_ms: f32) -> Self {
        self.total += duration_ms.max(0.0);
        self.frames.push(Frame { image, end_time: self.total });
        self
    }

    /// Cut a sprite sheet of `sheet_width × sheet_height` pixels into
    /// `columns × rows` equal frames, read left-to-right, top-to-bottom.
    pub fn from_sheet(
        key: ImageKey,
        sheet_width: i32,
        sheet_height: i32,
        columns: u16,
        rows: u16,
        duration_ms: f32,
    ) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let w = sheet_width / columns as i32;
        let h = sheet_height / rows as i32;
        let mut anim = Animation::new(Image::new(key, 0, w, h), duration_ms);
        for i in 1..(columns * rows) {
            anim = anim.with_frame(Image::new(key, i, w, h), duration_ms);
        }
        anim
    }

    /// Image of the frame currently showing.
    pub fn image(&self) -> Image {
        self.frames[self.current].image
    }

    #[allow(dead_code)]
    pub fn frame_index(&self) -> usize {
        self.current
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Rewind to the first frame.
    #[allow(dead_code)]
    pub fn restart(&mut self) {
        self.current = 0;
        self.clock = 0.0;
    }

    /// Advance the clock by `elapsed_ms`, wrapping past the last frame.
    pub fn update(&mut self, elapsed_ms: f32) {
        if self.frames.len() < 2 || self.total <= 0.0 {
            return;
        }
        self.clock += elapsed_ms.max(0.0);
        if self.clock >= self.total {
            self.clock %= self.total;
            self.current = 0;
        }
        let last = self.frames.len() - 1;
        while self.current < last && self.clock > self.frames[self.current].end_time {
            self.current += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_frames() -> Animation {
        Animation::new(Image::new(ImageKey::Alien, 0, 32, 23), 100.0)
            .with_frame(Image::new(ImageKey::Alien, 1, 32, 23), 100.0)
            .with_frame(Image::new(ImageKey::Alien, 2, 32, 23), 100.0)
    }

    #[test]
    fn advances_after_duration() {
        let mut a = three_frames();
        a.update(100.0);
        assert_eq!(a.frame_index(), 0); // exactly at end: not yet exceeded
        a.update(1.0);
        assert_eq!(a.frame_index(), 1);
        a.update(150.0);
        assert_eq!(a.frame_index(), 2);
    }

    #[test]
    fn wraps_cyclically() {
        let mut a = three_frames();
        a.update(310.0);
        assert_eq!(a.frame_index(), 0);
        a.update(95.0);
        assert_eq!(a.frame_index(), 1);
    }

    #[test]
    fn zero_elapsed_and_zero_duration_are_safe() {
        let mut a = three_frames();
        a.update(0.0);
        assert_eq!(a.frame_index(), 0);

        let mut z = Animation::new(Image::new(ImageKey::Dot, 0, 8, 8), 0.0)
            .with_frame(Image::new(ImageKey::Dot, 1, 8, 8), 0.0);
        z.update(16.0);
        z.update(0.0);
        assert_eq!(z.frame_index(), 0);
    }

    #[test]
    fn restart_rewinds() {
        let mut a = three_frames();
        a.update(250.0);
        assert_eq!(a.frame_index(), 2);
        a.restart();
        assert_eq!(a.frame_index(), 0);
        a.update(50.0);
        assert_eq!(a.frame_index(), 0);
    }

    #[test]
    fn sheet_splits_evenly() {
        let a = Animation::from_sheet(ImageKey::Bird, 224, 48, 4, 1, 60.0);
        assert_eq!(a.len(), 4);
        let img = a.image();
        assert_eq!((img.width, img.height), (56, 48));
        assert_eq!(img.frame, 0);
    }
}
