//! Element reader: turns an arbitrarily chunked byte stream into whole
//! Binary-XML elements delivered to a listener.

use tracing::trace;

use crate::buffer::DynamicBuffer;
use crate::structure::StructureDecoder;
use crate::Error;

/// Receiver for complete elements. The slice is only valid for the
/// duration of the call; copy it if it must outlive the delivery.
pub trait ElementListener {
    fn on_element(&mut self, element: &[u8]);
}

impl<F> ElementListener for F
where
    F: FnMut(&[u8]),
{
    fn on_element(&mut self, element: &[u8]) {
        self(element)
    }
}

/// Reassembles elements from a byte stream.
///
/// Each call to [`ElementReader::on_received_data`] may carry any slice of
/// the stream: several elements, a fraction of one, or a run that ends in
/// the middle of a header. Whole elements contained in a single chunk are
/// delivered zero-copy straight out of the caller's buffer; fragmented
/// ones are accumulated in a carry-over buffer first. Elements are
/// delivered in the order their closing byte arrives.
#[derive(Debug)]
pub struct ElementReader<L> {
    listener: L,
    structure_decoder: StructureDecoder,
    use_partial_data: bool,
    partial_data: DynamicBuffer,
    partial_data_length: usize,
}

impl<L: ElementListener> ElementReader<L> {
    pub fn new(listener: L) -> Self {
        ElementReader {
            listener,
            structure_decoder: StructureDecoder::new(),
            use_partial_data: false,
            partial_data: DynamicBuffer::new(),
            partial_data_length: 0,
        }
    }

    /// True while a fragment of an undelivered element is buffered.
    pub fn has_partial_data(&self) -> bool {
        self.use_partial_data
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Feed the next chunk of the stream, delivering every element whose
    /// end it contains.
    pub fn on_received_data(&mut self, data: &[u8]) -> Result<(), Error> {
        let mut data = data;

        // The chunk may hold several elements.
        loop {
            self.structure_decoder.seek(0);
            let got_element_end = self.structure_decoder.find_element_end(data)?;

            if !got_element_end {
                // Save the remainder for a later call.
                if !self.use_partial_data {
                    self.use_partial_data = true;
                    self.partial_data_length = 0;
                }
                self.partial_data.set(self.partial_data_length, data);
                self.partial_data_length += data.len();

                if tracing::event_enabled!(tracing::Level::TRACE) {
                    trace!(
                        buffered = self.partial_data_length,
                        "element incomplete, carrying over"
                    );
                }

                return Ok(());
            }

            let consumed = self.structure_decoder.offset();

            if self.use_partial_data {
                // Earlier chunks hold the front of this element; append the
                // tail and deliver the reassembled copy.
                self.partial_data
                    .set(self.partial_data_length, &data[..consumed]);
                self.partial_data_length += consumed;

                let element = &self.partial_data.as_slice()[..self.partial_data_length];
                if tracing::event_enabled!(tracing::Level::TRACE) {
                    trace!(
                        len = element.len(),
                        data = hex::encode(element),
                        "delivering reassembled element"
                    );
                }
                self.listener.on_element(element);

                self.use_partial_data = false;
                self.partial_data_length = 0;
            } else {
                // The whole element sits in the caller's buffer.
                let element = &data[..consumed];
                if tracing::event_enabled!(tracing::Level::TRACE) {
                    trace!(
                        len = element.len(),
                        data = hex::encode(element),
                        "delivering element"
                    );
                }
                self.listener.on_element(element);
            }

            data = &data[consumed..];
            self.structure_decoder.reset();
            if data.is_empty() {
                return Ok(());
            }
        }
    }
}
