//! Fixed-size binary encoding of bin records.

use binning::{BinRecord, ChannelStatistics};
use bytes::{Buf, BufMut};

/// Bytes of the fixed record prefix: bin index, observation and scene counts,
/// center latitude and longitude.
pub const RECORD_PREFIX_SIZE: usize = 5 * 8;

/// Bytes per channel: count and six statistics.
pub const CHANNEL_SIZE: usize = 7 * 8;

/// Encoded size of one record with `num_channels` channels.
pub fn record_size(num_channels: usize) -> usize {
    RECORD_PREFIX_SIZE + num_channels * CHANNEL_SIZE
}

/// Append one record.
pub fn encode_record<B: BufMut>(buf: &mut B, record: &BinRecord) {
    buf.put_u64_le(record.bin_index);
    buf.put_u64_le(record.num_obs);
    buf.put_u64_le(record.num_scenes);
    buf.put_f64_le(record.center_lat);
    buf.put_f64_le(record.center_lon);
    for channel in &record.channels {
        buf.put_u64_le(channel.count);
        buf.put_f64_le(channel.mean);
        buf.put_f64_le(channel.variance);
        buf.put_f64_le(channel.min);
        buf.put_f64_le(channel.max);
        buf.put_f64_le(channel.weighted_mean);
        buf.put_f64_le(channel.weight);
    }
}

/// Decode one record. The buffer must hold at least
/// [`record_size`]`(num_channels)` bytes.
pub fn decode_record<B: Buf>(buf: &mut B, num_channels: usize) -> BinRecord {
    let bin_index = buf.get_u64_le();
    let num_obs = buf.get_u64_le();
    let num_scenes = buf.get_u64_le();
    let center_lat = buf.get_f64_le();
    let center_lon = buf.get_f64_le();
    let channels = (0..num_channels)
        .map(|_| ChannelStatistics {
            count: buf.get_u64_le(),
            mean: buf.get_f64_le(),
            variance: buf.get_f64_le(),
            min: buf.get_f64_le(),
            max: buf.get_f64_le(),
            weighted_mean: buf.get_f64_le(),
            weight: buf.get_f64_le(),
        })
        .collect();

    BinRecord {
        bin_index,
        center_lat,
        center_lon,
        num_obs,
        num_scenes,
        channels,
    }
}

/// Bin index of the record starting at `offset`, without decoding the rest.
pub fn peek_bin_index(payload: &[u8], offset: usize) -> u64 {
    let mut head = &payload[offset..offset + 8];
    head.get_u64_le()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> BinRecord {
        BinRecord {
            bin_index: 1026,
            center_lat: 45.34,
            center_lon: 90.0,
            num_obs: 3,
            num_scenes: 2,
            channels: vec![
                ChannelStatistics {
                    count: 3,
                    mean: 0.25,
                    variance: 0.01,
                    min: 0.1,
                    max: 0.4,
                    weighted_mean: 0.26,
                    weight: 2.41,
                },
                ChannelStatistics::empty(),
            ],
        }
    }

    #[test]
    fn test_encoded_size() {
        let mut buf = Vec::new();
        encode_record(&mut buf, &sample_record());
        assert_eq!(buf.len(), record_size(2));
        assert_eq!(record_size(0), 40);
        assert_eq!(peek_bin_index(&buf, 0), 1026);
    }

    #[test]
    fn test_decode_preserves_nan_channels() {
        let mut buf = Vec::new();
        encode_record(&mut buf, &sample_record());
        let decoded = decode_record(&mut buf.as_slice(), 2);
        assert_eq!(decoded.bin_index, 1026);
        assert_eq!(decoded.channels[0], sample_record().channels[0]);
        assert_eq!(decoded.channels[1].count, 0);
        assert!(decoded.channels[1].mean.is_nan());
    }
}
