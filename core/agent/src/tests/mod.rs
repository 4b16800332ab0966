mod dataset_tests;
