/// An append-only encoder producing the format read by [`crate::WireReader`].
///
/// ```
/// let mut writer = kiwi_bridge_wire::WireWriter::new();
/// writer.write_string("🍕");
/// writer.write_var_uint(123456789);
/// assert_eq!(writer.into_bytes(), [240, 159, 141, 149, 0, 149, 154, 239, 58]);
/// ```
#[derive(Debug, Default)]
pub struct WireWriter {
    data: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> WireWriter {
        WireWriter { data: Vec::new() }
    }

    /// Consumes the writer and hands back everything written so far.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn write_bool(&mut self, value: bool) {
        self.data.push(value as u8);
    }

    pub fn write_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    /// Zig-zag encodes `value` so small negative numbers stay short.
    pub fn write_var_int(&mut self, value: i32) {
        self.write_var_uint(((value << 1) ^ (value >> 31)) as u32);
    }

    pub fn write_var_uint(&mut self, mut value: u32) {
        loop {
            let byte = value as u8 & 127;
            value >>= 7;

            if value == 0 {
                self.write_byte(byte);
                return;
            }

            self.write_byte(byte | 128);
        }
    }

    /// Writes the UTF-8 bytes of `value` followed by a NUL terminator. The
    /// caller must not pass strings containing NUL.
    pub fn write_string(&mut self, value: &str) {
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WireReader;

    fn write_once(cb: fn(&mut WireWriter)) -> Vec<u8> {
        let mut writer = WireWriter::new();
        cb(&mut writer);
        writer.into_bytes()
    }

    #[test]
    fn write_var_int() {
        assert_eq!(write_once(|w| w.write_var_int(0)), [0]);
        assert_eq!(write_once(|w| w.write_var_int(-1)), [1]);
        assert_eq!(write_once(|w| w.write_var_int(1)), [2]);
        assert_eq!(write_once(|w| w.write_var_int(-64)), [127]);
        assert_eq!(write_once(|w| w.write_var_int(64)), [128, 1]);
        assert_eq!(write_once(|w| w.write_var_int(i32::MIN)), [255, 255, 255, 255, 15]);
    }

    #[test]
    fn write_var_uint() {
        assert_eq!(write_once(|w| w.write_var_uint(127)), [127]);
        assert_eq!(write_once(|w| w.write_var_uint(128)), [128, 1]);
        assert_eq!(write_once(|w| w.write_var_uint(u32::MAX)), [255, 255, 255, 255, 15]);
    }

    #[test]
    fn write_string() {
        assert_eq!(write_once(|w| w.write_string("")), [0]);
        assert_eq!(write_once(|w| w.write_string("abc")), [97, 98, 99, 0]);
    }

    #[test]
    fn reader_accepts_writer_output() {
        let mut writer = WireWriter::new();
        writer.write_bool(true);
        writer.write_var_int(-129);
        writer.write_string("Color");
        writer.write_bytes(&[7, 8]);
        assert_eq!(writer.len(), 11);

        let bytes = writer.into_bytes();
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_bool(), Ok(true));
        assert_eq!(reader.read_var_int(), Ok(-129));
        assert_eq!(reader.read_string().unwrap(), "Color");
        assert_eq!(reader.read_bytes(2), Ok([7, 8].as_slice()));
        assert!(reader.is_at_end());
    }
}
