use std::cell::RefCell;
use std::rc::Rc;

use ccnb_codec::{Decoder, ElementReader, Error, StructureDecoder};
use proptest::prelude::*;

// A complete Interest element captured off the wire: name /ndn/abc with
// selectors, a 32-byte publisher digest, an exclude, a lifetime and a
// nonce.
const INTEREST_WIRE: &str = concat!(
    "01d2",
    "f2fa9d6e646e00fa9d6162630000",
    "059a9e31323300",
    "05a28e3400",
    "03e20285000102030405060708090a0b0c0d0e0f",
    "101112131415161718191a1b1c1d1e1f00",
    "02dafa9d61626300ea0000",
    "05aa8e3100",
    "02fa8e3400",
    "02d28e3200",
    "03829d01e00000",
    "02cab561626162616200",
    "00",
);

fn interest_wire() -> Vec<u8> {
    hex::decode(INTEREST_WIRE).unwrap()
}

fn collecting_reader() -> (
    ElementReader<impl FnMut(&[u8])>,
    Rc<RefCell<Vec<Vec<u8>>>>,
) {
    let received: Rc<RefCell<Vec<Vec<u8>>>> = Rc::default();
    let sink = received.clone();
    let reader = ElementReader::new(move |element: &[u8]| {
        sink.borrow_mut().push(element.to_vec());
    });
    (reader, received)
}

#[test]
fn whole_packet_is_one_element() {
    let packet = interest_wire();

    let (mut reader, received) = collecting_reader();
    reader.on_received_data(&packet).unwrap();

    assert_eq!(received.borrow().as_slice(), &[packet]);
    assert!(!reader.has_partial_data());
}

#[test]
fn every_two_way_split_delivers_the_same_element() {
    let packet = interest_wire();

    for split in 1..packet.len() {
        let (mut reader, received) = collecting_reader();
        reader.on_received_data(&packet[..split]).unwrap();
        assert!(
            received.borrow().is_empty(),
            "split {split}: nothing may be delivered before the end arrives"
        );

        reader.on_received_data(&packet[split..]).unwrap();
        assert_eq!(
            received.borrow().as_slice(),
            &[packet.clone()],
            "split {split}: reassembly must reproduce the packet"
        );
        assert!(!reader.has_partial_data(), "split {split}");
    }
}

#[test]
fn byte_at_a_time_feed_delivers_once() {
    let packet = interest_wire();

    let (mut reader, received) = collecting_reader();
    for byte in &packet {
        reader.on_received_data(std::slice::from_ref(byte)).unwrap();
    }

    assert_eq!(received.borrow().as_slice(), &[packet]);
    assert!(!reader.has_partial_data());
}

#[test]
fn back_to_back_packets_split_mid_boundary() {
    let packet = interest_wire();
    let mut stream = packet.clone();
    stream.extend_from_slice(&packet);

    // Split inside the second packet's publisher digest.
    let split = packet.len() + 40;
    let (mut reader, received) = collecting_reader();
    reader.on_received_data(&stream[..split]).unwrap();
    reader.on_received_data(&stream[split..]).unwrap();

    assert_eq!(received.borrow().as_slice(), &[packet.clone(), packet]);
}

#[test]
fn structure_decoder_consumes_the_packet_exactly_once() {
    let packet = interest_wire();

    let mut decoder = StructureDecoder::new();
    assert!(decoder.find_element_end(&packet).unwrap());
    assert_eq!(decoder.offset(), packet.len());
}

#[test]
fn truncated_input_is_need_more_for_the_reader_but_fatal_one_shot() {
    // Ends inside the 2-byte Interest DTAG header.
    let packet = interest_wire();
    let truncated = &packet[..1];

    let mut decoder = Decoder::new(truncated);
    assert_eq!(decoder.decode_type_and_value(), Err(Error::ReadPastEnd));

    let (mut reader, received) = collecting_reader();
    reader.on_received_data(truncated).unwrap();
    assert!(received.borrow().is_empty());
    assert!(reader.has_partial_data());
}

proptest! {
    #[test]
    fn arbitrary_chunking_is_equivalent(
        mut splits in proptest::collection::vec(1usize..109, 0..8)
    ) {
        let packet = interest_wire();
        splits.sort_unstable();
        splits.dedup();

        let (mut reader, received) = collecting_reader();
        let mut start = 0;
        for split in splits {
            reader.on_received_data(&packet[start..split]).unwrap();
            start = split;
        }
        reader.on_received_data(&packet[start..]).unwrap();

        let received_ref = received.borrow();
        prop_assert_eq!(received_ref.as_slice(), &[packet.clone()]);
        prop_assert!(!reader.has_partial_data());
    }
}
