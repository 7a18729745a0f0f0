//! CRC-8 appended to every radio packet (polynomial 0x9B, MSB-first, init 0)

const POLYNOMIAL: u8 = 0x9B;

const CRC8_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the checksum byte for `data`
pub fn compute(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, &b| CRC8_TABLE[(crc ^ b) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_prefix() {
        assert_eq!(&CRC8_TABLE[..4], &[0x00, 0x9B, 0xAD, 0x36]);
    }

    #[test]
    fn test_empty_and_single_byte() {
        assert_eq!(compute(&[]), 0x00);
        assert_eq!(compute(&[0x01]), 0x9B);
    }

    #[test]
    fn test_appending_crc_yields_zero_remainder() {
        let mut frame = vec![0xa7, 0x20, 0x88, 0x50, 0x8d, 0x00];
        let crc = compute(&frame);
        frame.push(crc);
        assert_eq!(compute(&frame), 0);
    }
}
