/*!
 * Frame Codec Tests
 * Frame dispatch and the frame channel transport
 */

use pretty_assertions::assert_eq;
use tlsf_arena::control::codec::{decode_reply, encode_request, REQUEST_FRAME_LEN};
use tlsf_arena::control::{
    AllocRequest, ControlChannel, ControlError, Dispatcher, FrameChannel, Status, ALLOC_TLSF,
    FREE_TLSF,
};

#[test]
fn test_dispatch_frame_allocates() {
    let dispatcher = Dispatcher::new().unwrap();
    let frame = encode_request(ALLOC_TLSF, &AllocRequest::allocate(512)).unwrap();
    assert_eq!(frame.len(), REQUEST_FRAME_LEN);

    let reply = dispatcher.dispatch_frame(&frame).unwrap();
    let (response, status) = decode_reply(&reply).unwrap().response().unwrap();

    assert_eq!(status, Status::Success);
    assert_eq!(response.size, 512);
    assert!(dispatcher.tlsf().is_live(response.pointer));
}

#[test]
fn test_malformed_frames_touch_nothing() {
    let dispatcher = Dispatcher::new().unwrap();
    let before = dispatcher.tlsf().blocks();

    let mut frame = encode_request(ALLOC_TLSF, &AllocRequest::allocate(512)).unwrap();
    frame.push(0);
    assert!(matches!(
        dispatcher.dispatch_frame(&frame),
        Err(ControlError::FrameSize { .. })
    ));
    assert!(matches!(
        dispatcher.dispatch_frame(&[]),
        Err(ControlError::FrameSize { .. })
    ));

    assert_eq!(dispatcher.tlsf().blocks(), before);
}

#[test]
fn test_unknown_command_frame_is_a_status() {
    let dispatcher = Dispatcher::new().unwrap();
    let frame = encode_request(0x1234, &AllocRequest::allocate(64)).unwrap();

    let reply = dispatcher.dispatch_frame(&frame).unwrap();
    let (response, status) = decode_reply(&reply).unwrap().response().unwrap();
    assert_eq!(status, Status::InvalidRequest);
    assert_eq!(response, AllocRequest::allocate(64));
}

#[test]
fn test_frame_channel_reports_failures() {
    let dispatcher = Dispatcher::new().unwrap();
    let channel = FrameChannel::new(dispatcher);
    assert_eq!(channel.transport(), "frame");

    let (_, status) = channel
        .call(ALLOC_TLSF, AllocRequest::allocate(32 * 1024 * 1024))
        .unwrap();
    assert_eq!(status, Status::OutOfMemory);

    let (_, status) = channel.call(FREE_TLSF, AllocRequest::free(0x40)).unwrap();
    assert_eq!(status, Status::InvalidPointer);
}
