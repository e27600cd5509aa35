//! A fake backend that records every call and answers with scripted results.

use nic_resource_op::{
    FilterAddOutput, FilterAddRequest, FilterId, FilterQueryOutput, ResourceId, ResourceOpChannel,
    ResourceOpError, SpecialFilterRequest,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Call {
    Special(ResourceId, SpecialFilterRequest),
    Add(ResourceId, FilterAddRequest),
    Del(ResourceId, Option<FilterId>),
    Query(ResourceId, Option<FilterId>),
}

pub struct RecordingChannel {
    pub calls: Vec<Call>,
    pub special_result: Result<Option<u16>, ResourceOpError>,
    pub add_result: Result<FilterAddOutput, ResourceOpError>,
    pub del_result: Result<(), ResourceOpError>,
    pub query_result: Result<FilterQueryOutput, ResourceOpError>,
}

impl RecordingChannel {
    pub const FILTER_ID: FilterId = FilterId(7);
    pub const RXQ: u16 = 3;

    pub fn new() -> RecordingChannel {
        RecordingChannel {
            calls: Vec::new(),
            special_result: Ok(None),
            add_result: Ok(FilterAddOutput { filter_id: Self::FILTER_ID, rxq: Some(Self::RXQ) }),
            del_result: Ok(()),
            query_result: Ok(FilterQueryOutput::default()),
        }
    }
}

impl ResourceOpChannel for RecordingChannel {
    fn special_filter_op(
        &mut self,
        resource: ResourceId,
        request: &SpecialFilterRequest,
    ) -> Result<Option<u16>, ResourceOpError> {
        self.calls.push(Call::Special(resource, *request));
        self.special_result
    }

    fn filter_add(
        &mut self,
        resource: ResourceId,
        request: &FilterAddRequest,
    ) -> Result<FilterAddOutput, ResourceOpError> {
        self.calls.push(Call::Add(resource, *request));
        self.add_result
    }

    fn filter_del(&mut self, resource: ResourceId, filter_id: Option<FilterId>) -> Result<(), ResourceOpError> {
        self.calls.push(Call::Del(resource, filter_id));
        self.del_result
    }

    fn filter_query(
        &mut self,
        resource: ResourceId,
        filter_id: Option<FilterId>,
    ) -> Result<FilterQueryOutput, ResourceOpError> {
        self.calls.push(Call::Query(resource, filter_id));
        self.query_result
    }
}
