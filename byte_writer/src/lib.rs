//! Little-endian byte buffer for writing binary file formats.

#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    pub data: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn get_offset(&self) -> usize {
        self.data.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn append_u8(&mut self, i: u8) {
        self.data.push(i);
    }

    pub fn append_i8(&mut self, i: i8) {
        self.data.extend_from_slice(&i.to_le_bytes());
    }

    pub fn append_u16(&mut self, i: u16) {
        self.data.extend_from_slice(&i.to_le_bytes());
    }

    pub fn append_i16(&mut self, i: i16) {
        self.data.extend_from_slice(&i.to_le_bytes());
    }

    pub fn append_u32(&mut self, i: u32) {
        self.data.extend_from_slice(&i.to_le_bytes());
    }

    pub fn append_i32(&mut self, i: i32) {
        self.data.extend_from_slice(&i.to_le_bytes());
    }

    pub fn append_f32(&mut self, i: f32) {
        self.data.extend_from_slice(&i.to_le_bytes());
    }

    pub fn append_u8_slice(&mut self, i: &[u8]) {
        self.data.extend_from_slice(i);
    }

    pub fn append_u32_slice(&mut self, i: &[u32]) {
        i.iter().for_each(|&x| self.append_u32(x));
    }

    pub fn append_f32_slice(&mut self, i: &[f32]) {
        i.iter().for_each(|&x| self.append_f32(x));
    }

    /// Appends the string bytes without a null terminator.
    pub fn append_string(&mut self, s: &str) {
        self.append_u8_slice(s.as_bytes());
    }

    /// Appends the string bytes into a fixed-width field, padding with nulls.
    ///
    /// The string is truncated if it is longer than `width`.
    pub fn append_string_fixed(&mut self, s: &str, width: usize) {
        let bytes = s.as_bytes();
        let len = bytes.len().min(width);

        self.append_u8_slice(&bytes[..len]);
        self.data.extend(std::iter::repeat(0u8).take(width - len));
    }

    pub fn replace_with_u32(&mut self, offset: usize, i: u32) {
        self.data[offset..offset + 4].copy_from_slice(&i.to_le_bytes());
    }

    pub fn replace_with_i32(&mut self, offset: usize, i: i32) {
        self.data[offset..offset + 4].copy_from_slice(&i.to_le_bytes());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn primitives() {
        let mut w = ByteWriter::new();

        w.append_u8(0xff);
        w.append_u16(0x1234);
        w.append_i32(-1);
        w.append_f32(1.0);

        assert_eq!(w.get_offset(), 11);
        assert_eq!(&w.data[..3], &[0xff, 0x34, 0x12]);
        assert_eq!(&w.data[3..7], &[0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn fixed_string_pads_and_truncates() {
        let mut w = ByteWriter::new();

        w.append_string_fixed("AAATRIGGER", 16);
        assert_eq!(w.get_offset(), 16);
        assert_eq!(&w.data[10..], &[0; 6]);

        let mut w = ByteWriter::new();
        w.append_string_fixed("averyverylongtexturename", 16);
        assert_eq!(w.get_offset(), 16);
    }

    #[test]
    fn patching() {
        let mut w = ByteWriter::new();

        w.append_u32(0);
        w.append_string("body");
        w.replace_with_u32(0, 4);

        assert_eq!(&w.data[..4], &4u32.to_le_bytes());
    }
}
