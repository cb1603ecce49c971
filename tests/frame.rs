mod common;

mod frame {
    use crate::common::{Bus, BusEvent, led_packet};
    use panel_hub::bus::Panel;
    use panel_hub::frame::{
        BYTES_PER_PANEL, BYTES_PER_SEGMENT, COMPLETE_FRAME, LedFrameAssembler, LedHeader,
    };
    use pretty_assertions::assert_eq;

    fn all_segments() -> Vec<(Panel, u8)> {
        Panel::ALL
            .iter()
            .flat_map(|&panel| (0..4).map(move |segment| (panel, segment)))
            .collect()
    }

    /// Fisher-Yates driven by a small LCG, enough to vary the arrival order.
    fn shuffled(seed: u32) -> Vec<(Panel, u8)> {
        let mut segments = all_segments();
        let mut state = seed;
        for i in (1..segments.len()).rev() {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let j = (state >> 16) as usize % (i + 1);
            segments.swap(i, j);
        }
        segments
    }

    #[test]
    fn header_layout() {
        let header = LedHeader::decode(0b10_11_0101);
        assert_eq!(
            header,
            LedHeader {
                panel: Panel::Up,
                segment: 3,
                frame: 5,
            }
        );
        assert_eq!(header.encode(), 0b10_11_0101);

        assert_eq!(LedHeader::decode(0x00).panel, Panel::Left);
        assert_eq!(LedHeader::decode(0xFF).panel, Panel::Right);
        assert_eq!(LedHeader::decode(0xFF).frame, 0x0F);
    }

    #[test]
    fn complete_in_any_order() {
        for seed in 0..32 {
            let mut assembler = LedFrameAssembler::new();
            let mut bus = Bus::default();
            let order = shuffled(seed);

            for (i, &(panel, segment)) in order.iter().enumerate() {
                assert!(!assembler.is_complete(), "seed {seed}, after {i} segments");
                assembler.push(&led_packet(panel, segment, 7, i as u8), &mut bus);
            }

            assert!(assembler.is_complete(), "seed {seed}");
            assert_eq!(assembler.segments_received(), COMPLETE_FRAME);
            assert_eq!(bus.segments(), 16);
            assert_eq!(bus.commits(), 0);
        }
    }

    #[test]
    fn fifteen_segments_are_not_enough() {
        let mut assembler = LedFrameAssembler::new();
        let mut bus = Bus::default();

        for &(panel, segment) in &all_segments()[1..] {
            assembler.push(&led_packet(panel, segment, 2, 0), &mut bus);
        }
        // the next frame starts, the incomplete one is never committed
        assembler.push(&led_packet(Panel::Left, 0, 3, 0), &mut bus);

        assert_eq!(bus.commits(), 0);
        assert_eq!(assembler.segments_received(), 0b1);
    }

    #[test]
    fn commit_goes_out_with_the_next_packet() {
        let mut assembler = LedFrameAssembler::new();
        let mut bus = Bus::default();

        for (panel, segment) in all_segments() {
            let assembled = assembler.push(&led_packet(panel, segment, 1, 0), &mut bus);
            assert!(!assembled.committed);
        }
        bus.events.clear();

        let assembled = assembler.push(&led_packet(Panel::Down, 2, 2, 0xAB), &mut bus);

        assert!(assembled.committed);
        assert_eq!(
            &bus.events[..4],
            &[
                BusEvent::Commit(Panel::Left),
                BusEvent::Commit(Panel::Down),
                BusEvent::Commit(Panel::Up),
                BusEvent::Commit(Panel::Right),
            ]
        );
        assert!(matches!(bus.events[4], BusEvent::Segment(Panel::Down, _)));
        assert_eq!(bus.events.len(), 5);
        assert_eq!(assembler.segments_received(), 1 << (4 + 2));
    }

    #[test]
    fn commit_happens_once_per_frame() {
        let mut assembler = LedFrameAssembler::new();
        let mut bus = Bus::default();

        for (panel, segment) in all_segments() {
            assembler.push(&led_packet(panel, segment, 4, 0), &mut bus);
        }
        // repeats of the same frame after the commit start a fresh mask
        for (panel, segment) in all_segments().into_iter().take(3) {
            assembler.push(&led_packet(panel, segment, 4, 0), &mut bus);
        }

        assert_eq!(bus.commits(), 4);
        assert!(!assembler.is_complete());
    }

    #[test]
    fn frame_change_discards_progress() {
        let mut assembler = LedFrameAssembler::new();
        let mut bus = Bus::default();

        for &(panel, segment) in &all_segments()[..10] {
            assembler.push(&led_packet(panel, segment, 0, 0), &mut bus);
        }
        assembler.push(&led_packet(Panel::Right, 3, 1, 0), &mut bus);
        assert_eq!(assembler.segments_received(), 1 << 15);
        assert_eq!(assembler.previous_frame(), Some(1));

        // old segments of frame 0 arriving late do not complete frame 1
        for &(panel, segment) in &all_segments()[10..15] {
            assembler.push(&led_packet(panel, segment, 0, 0), &mut bus);
        }
        assert!(!assembler.is_complete());
        assert_eq!(bus.commits(), 0);
    }

    #[test]
    fn duplicates_are_idempotent() {
        let mut assembler = LedFrameAssembler::new();
        let mut bus = Bus::default();

        assembler.push(&led_packet(Panel::Up, 1, 9, 0x01), &mut bus);
        let mask = assembler.segments_received();
        assembler.push(&led_packet(Panel::Up, 1, 9, 0x02), &mut bus);

        assert_eq!(assembler.segments_received(), mask);
        // every packet is still forwarded, the latest bytes win
        assert_eq!(bus.segments(), 2);
        let offset = 2 * BYTES_PER_PANEL + BYTES_PER_SEGMENT;
        assert_eq!(assembler.frame_data()[offset + 1], 0x02);
    }

    #[test]
    fn first_packet_starts_a_frame() {
        let mut assembler = LedFrameAssembler::default();
        let mut bus = Bus::default();
        assert_eq!(assembler.previous_frame(), None);

        let assembled = assembler.push(&led_packet(Panel::Left, 0, 0, 0), &mut bus);

        assert!(!assembled.committed);
        assert_eq!(assembler.segments_received(), 1);
        assert_eq!(assembler.previous_frame(), Some(0));
    }

    #[test]
    fn segment_is_forwarded_with_its_header() {
        let mut assembler = LedFrameAssembler::new();
        let mut bus = Bus::default();
        let packet = led_packet(Panel::Right, 2, 6, 0x5C);

        assembler.push(&packet, &mut bus);

        assert_eq!(
            bus.events,
            vec![BusEvent::Segment(Panel::Right, packet.as_bytes().to_vec())]
        );
        let offset = 3 * BYTES_PER_PANEL + 2 * BYTES_PER_SEGMENT;
        assert_eq!(
            &assembler.frame_data()[offset..offset + BYTES_PER_SEGMENT],
            &packet.as_bytes()[..]
        );
    }
}
