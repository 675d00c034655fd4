mod otp_store_tests;
